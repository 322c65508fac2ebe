//! Generation-driven invalidation of GPU resources.
//!
//! The tracker remembers the last observed generation of every settings
//! group. Each frame it reports which resources must be rebuilt; the rules
//! depend only on which groups changed, never on each other.

use bitflags::bitflags;

use crate::payload::{Generation, Generational, RenderSettings};

bitflags! {
    /// GPU resources that must be rebuilt before drawing this frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Invalidation: u8 {
        /// Swap chain settings may have changed (any group changed).
        const SWAP_CHAIN = 1 << 0;
        const SAMPLER = 1 << 1;
        const CUSTOM_SHADER = 1 << 2;
        const BACKGROUND_BITMAP = 1 << 3;
        const OFFSCREEN_TEXTURE = 1 << 4;
        const CONST_BUFFER = 1 << 5;
        /// Cached glyphs were rasterized for other font settings.
        const ATLAS = 1 << 6;
    }
}

/// Which settings groups differ from the last observed frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupChanges {
    pub font: bool,
    pub misc: bool,
    pub target_size: bool,
    pub cell_count: bool,
}

impl Invalidation {
    /// Map group changes to the resources they own.
    pub fn from_changes(c: GroupChanges) -> Self {
        let mut inv = Self::empty();
        if c.target_size || c.misc {
            inv |= Self::SAMPLER | Self::CUSTOM_SHADER | Self::OFFSCREEN_TEXTURE;
        }
        if c.cell_count {
            inv |= Self::BACKGROUND_BITMAP;
        }
        if c.target_size || c.font {
            inv |= Self::CONST_BUFFER;
        }
        if c.font {
            inv |= Self::ATLAS;
        }
        inv
    }
}

/// Last generations the backend built resources for. `None` means "never".
#[derive(Debug, Default)]
pub struct GenerationTracker {
    overall: Option<Generation>,
    font: Option<Generation>,
    misc: Option<Generation>,
    target_size: Option<Generation>,
    cell_count: Option<Generation>,
}

impl GenerationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare against the payload's settings and record them as observed.
    ///
    /// Returns an empty set when the overall generation is unchanged.
    pub fn observe(&mut self, settings: &Generational<RenderSettings>) -> Invalidation {
        if self.overall == Some(settings.generation()) {
            return Invalidation::empty();
        }

        let changes = GroupChanges {
            font: self.font != Some(settings.font.generation()),
            misc: self.misc != Some(settings.misc.generation()),
            target_size: self.target_size != Some(settings.target_size.generation()),
            cell_count: self.cell_count != Some(settings.cell_count.generation()),
        };

        self.overall = Some(settings.generation());
        self.font = Some(settings.font.generation());
        self.misc = Some(settings.misc.generation());
        self.target_size = Some(settings.target_size.generation());
        self.cell_count = Some(settings.cell_count.generation());

        Invalidation::SWAP_CHAIN | Invalidation::from_changes(changes)
    }

    /// Forget everything so the next frame rebuilds all resources.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
