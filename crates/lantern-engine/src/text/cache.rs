//! Bounded memo of laid-out strings.

use linked_hash_map::LinkedHashMap;

use crate::render::GpuBackend;

use super::layout::TextLayout;

/// Layouts keyed by `(size, text)`, least recently used first.
///
/// When full, inserting drops the oldest layout and destroys its mesh.
pub(crate) struct LayoutCache {
    capacity: usize,
    entries: LinkedHashMap<(u32, String), TextLayout>,
}

impl LayoutCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), entries: LinkedHashMap::new() }
    }

    /// Looks up a layout and marks it as the most recently used.
    pub(crate) fn get(&mut self, size: u32, text: &str) -> Option<TextLayout> {
        self.entries.get_refresh(&(size, text.to_string())).map(|layout| *layout)
    }

    pub(crate) fn insert(&mut self, backend: &mut dyn GpuBackend, size: u32, text: &str, layout: TextLayout) {
        if let Some(old) = self.entries.insert((size, text.to_string()), layout) {
            let kept = layout.item.map(|item| item.mesh);
            if let Some(item) = old.item.filter(|item| Some(item.mesh) != kept) {
                backend.destroy_mesh(item.mesh);
            }
            return;
        }
        while self.entries.len() > self.capacity {
            let Some(((size, text), evicted)) = self.entries.pop_front() else { break };
            log::trace!("evicting {size}px layout of {text:?}");
            if let Some(item) = evicted.item {
                backend.destroy_mesh(item.mesh);
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::render::{GpuCall, Image, Mesh, MeshId, RecordingBackend, RenderItem, Transform};

    fn layout(gpu: &mut RecordingBackend) -> TextLayout {
        let image = Image::solid(gpu, [255; 4]).unwrap();
        let mesh = Mesh::upload(gpu, &[], &[0, 1, 2]);
        TextLayout {
            item: Some(RenderItem::new(mesh, image, Transform::default())),
            extent: Vec2::new(10.0, 16.0),
        }
    }

    fn destroyed(gpu: &RecordingBackend) -> Vec<MeshId> {
        gpu.calls()
            .iter()
            .filter_map(|c| match c {
                GpuCall::DestroyMesh(m) => Some(*m),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn least_recently_used_layout_is_evicted() {
        let mut gpu = RecordingBackend::new(640, 480);
        let mut cache = LayoutCache::new(2);
        let (a, b, c) = (layout(&mut gpu), layout(&mut gpu), layout(&mut gpu));

        cache.insert(&mut gpu, 16, "a", a);
        cache.insert(&mut gpu, 16, "b", b);
        assert_eq!(cache.get(16, "a"), Some(a));
        cache.insert(&mut gpu, 16, "c", c);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(16, "b"), None);
        assert_eq!(cache.get(16, "a"), Some(a));
        assert_eq!(cache.get(16, "c"), Some(c));
        assert_eq!(destroyed(&gpu), vec![b.item.unwrap().mesh]);
    }

    #[test]
    fn size_is_part_of_the_key() {
        let mut gpu = RecordingBackend::new(640, 480);
        let mut cache = LayoutCache::new(4);
        let small = layout(&mut gpu);
        cache.insert(&mut gpu, 12, "hi", small);
        assert_eq!(cache.get(12, "hi"), Some(small));
        assert_eq!(cache.get(24, "hi"), None);
    }

    #[test]
    fn empty_layouts_evict_without_touching_the_gpu() {
        let mut gpu = RecordingBackend::new(640, 480);
        let mut cache = LayoutCache::new(1);
        cache.insert(&mut gpu, 16, " ", TextLayout::empty(16.0));
        let x = layout(&mut gpu);
        cache.insert(&mut gpu, 16, "x", x);
        assert_eq!(cache.len(), 1);
        assert!(destroyed(&gpu).is_empty());
    }
}
