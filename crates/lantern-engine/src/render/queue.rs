use std::collections::HashMap;

use super::backend::ImageId;
use super::item::RenderItem;

/// Items sharing one image.
#[derive(Debug, Clone)]
pub struct Batch {
    pub image: ImageId,
    pub items: Vec<RenderItem>,
}

/// Per-frame render queue grouped by image.
///
/// Performance characteristics:
/// - `push()` is O(1) amortized
/// - groups are kept in first-insertion order; items keep insertion order within a group
/// - `clear()` keeps the group vectors for reuse so a warmed queue does not allocate
#[derive(Debug, Default)]
pub struct BatchQueue {
    batches: Vec<Batch>,
    /// Number of live batches; entries past this are recycled storage.
    live: usize,
    index: HashMap<ImageId, usize>,
}

impl BatchQueue {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: RenderItem) {
        let key = item.image.id;
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = self.live;
                if slot == self.batches.len() {
                    self.batches.push(Batch { image: key, items: Vec::new() });
                } else {
                    self.batches[slot].image = key;
                }
                self.live += 1;
                self.index.insert(key, slot);
                slot
            }
        };
        self.batches[slot].items.push(item);
    }

    /// Drops every item. Keeps allocated capacity.
    pub fn clear(&mut self) {
        for batch in &mut self.batches[..self.live] {
            batch.items.clear();
        }
        self.live = 0;
        self.index.clear();
    }

    #[inline]
    pub fn batches(&self) -> &[Batch] {
        &self.batches[..self.live]
    }

    pub fn len(&self) -> usize {
        self.batches().iter().map(|b| b.items.len()).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::MeshId;
    use crate::render::image::Image;
    use crate::render::mesh::Mesh;
    use crate::render::transform::Transform;

    fn item(image: u32, mesh: u32) -> RenderItem {
        RenderItem::new(
            Mesh { id: MeshId(mesh), index_count: 6 },
            Image { id: ImageId(image), width: 8, height: 8 },
            Transform::default(),
        )
    }

    #[test]
    fn groups_by_image_in_first_seen_order() {
        let mut q = BatchQueue::new();
        q.push(item(2, 0));
        q.push(item(1, 1));
        q.push(item(2, 2));

        let batches = q.batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].image, ImageId(2));
        assert_eq!(batches[0].items.iter().map(|i| i.mesh).collect::<Vec<_>>(), vec![MeshId(0), MeshId(2)]);
        assert_eq!(batches[1].image, ImageId(1));
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn clear_empties_and_reuses() {
        let mut q = BatchQueue::new();
        q.push(item(1, 0));
        q.push(item(2, 1));
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.len(), 0);

        q.push(item(3, 4));
        assert_eq!(q.batches().len(), 1);
        assert_eq!(q.batches()[0].image, ImageId(3));
        assert_eq!(q.batches()[0].items.len(), 1);
    }
}
