//! Skyline bottom-left rectangle packer.
//!
//! The packed region is described by its skyline: a list of horizontal
//! segments, each with the height of the tallest allocation below it. A new
//! rectangle is placed where the skyline under its width is lowest, with
//! ties broken by the least area wasted beneath it.
//!
//! Reference: Jukka Jylanki, "A Thousand Ways to Pack the Bin" (2010).

/// Start of a skyline segment. The segment extends to the next node's `x`
/// (or the packer width for the last node).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Node {
    x: u32,
    y: u32,
}

/// Allocates rectangles inside a fixed `width x height` area.
#[derive(Debug, Clone)]
pub struct RectPacker {
    width: u32,
    height: u32,
    nodes: Vec<Node>,
}

impl RectPacker {
    pub fn new(width: u32, height: u32) -> Self {
        let mut nodes = Vec::with_capacity(width.min(4096) as usize);
        nodes.push(Node { x: 0, y: 0 });
        Self {
            width,
            height,
            nodes,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Find space for a `w x h` rectangle and claim it.
    ///
    /// Returns the top-left corner, or `None` when no skyline span fits.
    pub fn pack(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if w == 0 || h == 0 {
            return Some((0, 0));
        }
        if w > self.width || h > self.height {
            return None;
        }

        // (node index, y, wasted area)
        let mut best: Option<(usize, u32, u64)> = None;
        for i in 0..self.nodes.len() {
            if self.nodes[i].x + w > self.width {
                break;
            }
            let (y, waste) = self.fit(i, w);
            if y + h > self.height {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, by, bw)) => y < by || (y == by && waste < bw),
            };
            if better {
                best = Some((i, y, waste));
            }
        }

        let (i, y, _) = best?;
        let x = self.nodes[i].x;
        self.place(i, x + w, y + h);
        Some((x, y))
    }

    /// Forget all allocations.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.nodes.push(Node { x: 0, y: 0 });
    }

    fn segment_end(&self, i: usize) -> u32 {
        self.nodes.get(i + 1).map_or(self.width, |n| n.x)
    }

    /// Lowest `y` at which a rectangle of width `w` starting at node `i`
    /// clears the skyline, and the area left empty underneath it.
    fn fit(&self, i: usize, w: u32) -> (u32, u64) {
        let x0 = self.nodes[i].x;
        let end = x0 + w;
        let mut y = 0;
        let mut waste = 0u64;
        let mut visited = 0u32;

        let mut j = i;
        while j < self.nodes.len() && self.nodes[j].x < end {
            let node = self.nodes[j];
            let seg_w = self.segment_end(j).min(end) - node.x;
            if node.y > y {
                // Raising the floor leaves a gap under everything visited so far.
                waste += u64::from(visited) * u64::from(node.y - y);
                y = node.y;
            } else {
                waste += u64::from(seg_w) * u64::from(y - node.y);
            }
            visited += seg_w;
            j += 1;
        }
        (y, waste)
    }

    /// Raise the skyline over `nodes[i].x..end` to `top`.
    fn place(&mut self, i: usize, end: u32, top: u32) {
        let mut last = i;
        while last + 1 < self.nodes.len() && self.nodes[last + 1].x < end {
            last += 1;
        }
        let tail_y = self.nodes[last].y;
        let tail_end = self.segment_end(last);

        let start = self.nodes[i].x;
        let mut replacement = vec![Node { x: start, y: top }];
        if end < tail_end {
            replacement.push(Node { x: end, y: tail_y });
        }
        self.nodes.splice(i..=last, replacement);

        // Adjacent segments at the same height collapse into one.
        self.nodes.dedup_by(|next, prev| next.y == prev.y);
    }
}
