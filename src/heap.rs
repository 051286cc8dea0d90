use anyhow::bail;
use tracing::debug;

/// Capability required from anything stored in a [`PriorityQueue`].
///
/// The queue only stores arena indices. Each element records where it sits in
/// the queue so it can be relocated after a key change without a scan.
pub trait Heapable {
    fn heap_index(&self) -> Option<usize>;
    fn set_heap_index(&mut self, index: Option<usize>);
    fn insertion_sequence(&self) -> u64;
    fn set_insertion_sequence(&mut self, sequence: u64);
    /// Whether `self` should move above `other` while bubbling up.
    fn has_priority_to_shift_up(&self, other: &Self) -> bool;
    /// Whether `self` should move above `other` while bubbling down.
    fn has_priority_to_shift_down(&self, other: &Self) -> bool;
}

pub const DEFAULT_CAPACITY: usize = 256;

/// Array-backed binary min-heap over elements of an external arena.
///
/// Every operation takes the arena so element bookkeeping (`heap_index`,
/// `insertion_sequence`) is updated in the same step as the array.
#[derive(Debug, Clone)]
pub struct PriorityQueue {
    elements: Vec<Option<usize>>,
    count: usize,
    total_inserted: u64,
    max_capacity: usize,
}

impl Default for PriorityQueue {
    fn default() -> Self {
        PriorityQueue::with_capacity(DEFAULT_CAPACITY, usize::MAX)
    }
}

impl PriorityQueue {
    /// Creates a queue with `initial` slots that may double up to `max` slots.
    pub fn with_capacity(initial: usize, max: usize) -> Self {
        let max_capacity = max.max(1);
        PriorityQueue {
            elements: vec![None; initial.clamp(1, max_capacity)],
            count: 0,
            total_inserted: 0,
            max_capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.elements.len()
    }

    /// Live elements in array order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.elements[..self.count].iter().flatten().copied()
    }

    pub fn peek(&self) -> Option<usize> {
        if self.count == 0 {
            None
        } else {
            Some(self.at(0))
        }
    }

    pub fn contains<T: Heapable>(&self, arena: &[T], id: usize) -> bool {
        arena[id]
            .heap_index()
            .is_some_and(|index| index < self.count && self.elements[index] == Some(id))
    }

    pub fn add<T: Heapable>(&mut self, arena: &mut [T], id: usize) -> anyhow::Result<()> {
        assert!(
            arena[id].heap_index().is_none(),
            "element {id} is already in the heap"
        );

        if self.count == self.elements.len() {
            self.grow()?;
        }

        let index = self.count;
        self.elements[index] = Some(id);
        self.total_inserted += 1;
        arena[id].set_heap_index(Some(index));
        arena[id].set_insertion_sequence(self.total_inserted);
        self.count += 1;

        self.shift_up(arena, id);
        Ok(())
    }

    pub fn extract_root<T: Heapable>(&mut self, arena: &mut [T]) -> Option<usize> {
        if self.count == 0 {
            return None;
        }

        let root = self.at(0);
        self.count -= 1;
        let last = self.at(self.count);
        self.swap(arena, root, last);
        self.elements[self.count] = None;

        if self.count > 0 {
            let new_root = self.at(0);
            self.shift_down(arena, new_root);
        }

        arena[root].set_heap_index(None);
        arena[root].set_insertion_sequence(0);
        Some(root)
    }

    /// Repositions `id` after its priority was changed by the caller.
    ///
    /// No-op for elements that are not in the queue.
    pub fn update_element_with_changed_val<T: Heapable>(&mut self, arena: &mut [T], id: usize) {
        let Some(index) = arena[id].heap_index() else {
            return;
        };
        assert!(
            index < self.count && self.elements[index] == Some(id),
            "element {id} records heap index {index} but is not stored there"
        );

        self.shift_down(arena, id);
        self.shift_up(arena, id);
    }

    pub fn clear<T: Heapable>(&mut self, arena: &mut [T]) {
        for slot in &mut self.elements[..self.count] {
            if let Some(id) = slot.take() {
                arena[id].set_heap_index(None);
                arena[id].set_insertion_sequence(0);
            }
        }
        self.count = 0;
        self.total_inserted = 0;
    }

    /// Checks the heap property and the index bookkeeping of every live element.
    ///
    /// A child outranks its parent only when it wins under both comparators;
    /// on equal keys the two tie-breaks disagree and either order is legal.
    pub fn verify<T: Heapable>(&self, arena: &[T]) -> bool {
        for index in 0..self.count {
            let Some(id) = self.elements[index] else {
                return false;
            };
            if arena[id].heap_index() != Some(index) {
                return false;
            }
            for child in [2 * index + 1, 2 * index + 2] {
                if child >= self.count {
                    continue;
                }
                let Some(child_id) = self.elements[child] else {
                    return false;
                };
                let child = &arena[child_id];
                if child.has_priority_to_shift_up(&arena[id])
                    && child.has_priority_to_shift_down(&arena[id])
                {
                    return false;
                }
            }
        }
        self.elements[self.count..].iter().all(Option::is_none)
    }

    fn grow(&mut self) -> anyhow::Result<()> {
        let capacity = self.elements.len();
        if capacity >= self.max_capacity {
            bail!(
                "open set exceeded its maximum capacity of {} elements",
                self.max_capacity
            );
        }
        let new_capacity = capacity.saturating_mul(2).min(self.max_capacity);
        debug!("grow heap from {capacity} to {new_capacity} slots");
        self.elements.resize(new_capacity, None);
        Ok(())
    }

    fn at(&self, index: usize) -> usize {
        self.elements[index]
            .unwrap_or_else(|| panic!("heap slot {index} is empty but inside the live range"))
    }

    fn index_of<T: Heapable>(&self, arena: &[T], id: usize) -> usize {
        arena[id]
            .heap_index()
            .unwrap_or_else(|| panic!("element {id} is not in the heap"))
    }

    fn shift_up<T: Heapable>(&mut self, arena: &mut [T], id: usize) {
        loop {
            let index = self.index_of(arena, id);
            if index == 0 {
                break;
            }
            let parent = self.at((index - 1) / 2);
            if !arena[id].has_priority_to_shift_up(&arena[parent]) {
                break;
            }
            self.swap(arena, id, parent);
        }
    }

    fn shift_down<T: Heapable>(&mut self, arena: &mut [T], id: usize) {
        loop {
            let index = self.index_of(arena, id);
            let left = 2 * index + 1;
            let right = left + 1;

            let mut most_priority = id;
            if left < self.count {
                let left_id = self.at(left);
                if arena[left_id].has_priority_to_shift_down(&arena[most_priority]) {
                    most_priority = left_id;
                }
            }
            if right < self.count {
                let right_id = self.at(right);
                if arena[right_id].has_priority_to_shift_down(&arena[most_priority]) {
                    most_priority = right_id;
                }
            }

            if most_priority == id {
                break;
            }
            self.swap(arena, id, most_priority);
        }
    }

    fn swap<T: Heapable>(&mut self, arena: &mut [T], first: usize, second: usize) {
        let first_index = self.index_of(arena, first);
        let second_index = self.index_of(arena, second);
        assert_eq!(self.elements[first_index], Some(first));
        assert_eq!(self.elements[second_index], Some(second));

        self.elements.swap(first_index, second_index);
        arena[first].set_heap_index(Some(second_index));
        arena[second].set_heap_index(Some(first_index));
    }
}
