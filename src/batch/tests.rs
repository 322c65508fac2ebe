use super::*;
use crate::testing::{Call, RecordingDevice};

fn quad(batch: &mut QuadBatch, i: usize) {
    let x = i as f32;
    batch.append_rect(
        Rect::new(x, 0.0, 1.0, 1.0),
        Rect::ZERO,
        i as u32,
        ShadingType::SolidFill,
    );
}

#[test]
fn instance_layout_is_48_bytes() {
    assert_eq!(std::mem::size_of::<QuadInstance>(), 48);
}

#[test]
fn indices_cover_two_triangles_per_quad() {
    let mut batch = QuadBatch::new();
    quad(&mut batch, 0);
    quad(&mut batch, 1);

    assert_eq!(batch.indices(), &[0, 1, 2, 3, 2, 1, 4, 5, 6, 7, 6, 5]);
}

#[test]
fn growth_keeps_every_instance() {
    let mut batch = QuadBatch::new();
    for i in 0..3000 {
        quad(&mut batch, i);
    }

    assert_eq!(batch.len(), 3000);
    assert_eq!(batch.indices().len(), 3000 * 6);
    for (i, inst) in batch.instances().iter().enumerate() {
        assert_eq!(inst.color, i as u32);
    }
    let last = 2999 * 4;
    assert_eq!(&batch.indices()[2999 * 6..], &[last, last + 1, last + 2, last + 3, last + 2, last + 1]);
}

#[test]
fn capacity_starts_at_minimum_and_doubles() {
    let mut batch = QuadBatch::new();
    assert_eq!(batch.capacity(), 0);

    quad(&mut batch, 0);
    assert_eq!(batch.capacity(), MIN_CAPACITY);

    for i in 1..=MIN_CAPACITY {
        quad(&mut batch, i);
    }
    assert_eq!(batch.capacity(), MIN_CAPACITY * 2);
}

#[test]
fn empty_flush_touches_nothing() {
    let mut device = RecordingDevice::new();
    let mut batch = QuadBatch::new();

    batch.flush(&mut device, Size::new(80, 24)).unwrap();

    assert!(device.calls.is_empty());
}

#[test]
fn flush_sizes_gpu_buffers_from_cell_count() {
    let mut device = RecordingDevice::new();
    let mut batch = QuadBatch::new();
    for i in 0..10 {
        quad(&mut batch, i);
    }

    batch.flush(&mut device, Size::new(80, 24)).unwrap();

    assert_eq!(
        device.calls,
        [
            Call::RecreateInstanceBuffer(1920),
            Call::RecreateIndexBuffer(1920 * 6),
            Call::WriteInstances(10),
            Call::WriteIndices(60),
            Call::DrawIndexed(60),
        ]
    );
    assert!(batch.is_empty());
    assert_eq!(batch.gpu_capacity(), 1920);
}

#[test]
fn flush_grows_by_half_beyond_cell_estimate() {
    let mut device = RecordingDevice::new();
    let mut batch = QuadBatch::new();
    for i in 0..100 {
        quad(&mut batch, i);
    }

    batch.flush(&mut device, Size::new(4, 4)).unwrap();

    assert_eq!(device.calls[0], Call::RecreateInstanceBuffer(150));
    assert_eq!(batch.gpu_capacity(), 150);
}

#[test]
fn flush_reuses_buffers_that_fit() {
    let mut device = RecordingDevice::new();
    let mut batch = QuadBatch::new();
    for i in 0..10 {
        quad(&mut batch, i);
    }
    batch.flush(&mut device, Size::new(80, 24)).unwrap();
    device.take_calls();

    for i in 0..20 {
        quad(&mut batch, i);
    }
    batch.flush(&mut device, Size::new(80, 24)).unwrap();

    assert_eq!(device.count(|c| matches!(c, Call::RecreateInstanceBuffer(_))), 0);
    assert_eq!(device.drawn().len(), 20);
}

#[test]
fn flush_restarts_index_numbering() {
    let mut device = RecordingDevice::new();
    let mut batch = QuadBatch::new();
    quad(&mut batch, 0);
    quad(&mut batch, 1);
    batch.flush(&mut device, Size::new(1, 1)).unwrap();

    quad(&mut batch, 2);
    assert_eq!(batch.indices(), &[0, 1, 2, 3, 2, 1]);
}

#[test]
fn shading_round_trips_through_raw() {
    let mut batch = QuadBatch::new();
    batch.append_rect(Rect::ZERO, Rect::ZERO, 0, ShadingType::DashedLine);
    assert_eq!(batch.instances()[0].shading(), Some(ShadingType::DashedLine));
    assert_eq!(QuadInstance::default().shading(), None);
}
