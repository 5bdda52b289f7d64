//! Bounded linear collections.
//!
//! This module provides [`Bounded`], an ordered sequence with an optional
//! maximum capacity, and the two facades built on it:
//! - [`Stack`] - insert and remove at the back (LIFO)
//! - [`Queue`] - insert at the back, remove at the front (FIFO)
//!
//! Capacity violations are a policy rejection, not an error: the insert is a
//! no-op that returns `false` and emits a `tracing` diagnostic. A seed
//! sequence supplied at construction is exempt and accepted whole even when
//! it exceeds capacity; only subsequent inserts are checked.

use std::collections::VecDeque;

/// An ordered sequence with an optional maximum capacity.
///
/// Both ends are exposed so [`Stack`] and [`Queue`] can share one mutation
/// contract and differ only in which end removal uses.
#[derive(Debug, Clone)]
pub struct Bounded<T> {
    items: VecDeque<T>,
    max_size: Option<usize>,
}

impl<T> Bounded<T> {
    /// Create an empty collection with an optional capacity.
    pub fn new(max_size: Option<usize>) -> Self {
        Self {
            items: VecDeque::new(),
            max_size,
        }
    }

    /// Create a collection seeded with `items`.
    ///
    /// The seed is accepted as-is even when it is longer than `max_size`;
    /// only later inserts are capacity-checked.
    pub fn with_items(items: Vec<T>, max_size: Option<usize>) -> Self {
        Self {
            items: items.into(),
            max_size,
        }
    }

    /// Append an item at the back.
    ///
    /// Returns `false` (leaving the sequence unchanged) when the collection
    /// is full. Never panics.
    pub fn insert(&mut self, item: T) -> bool {
        if self.is_full() {
            tracing::warn!(
                capacity = self.max_size.unwrap_or(0),
                "collection full, insert rejected"
            );
            return false;
        }
        self.items.push_back(item);
        true
    }

    /// Remove and return the back item, or `None` when empty.
    pub fn take_back(&mut self) -> Option<T> {
        self.items.pop_back()
    }

    /// Remove and return the front item, or `None` when empty.
    pub fn take_front(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Peek at the back item.
    pub fn back(&self) -> Option<&T> {
        self.items.back()
    }

    /// Peek at the front item.
    pub fn front(&self) -> Option<&T> {
        self.items.front()
    }

    /// Empty the collection unconditionally.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Remove every element the predicate matches.
    ///
    /// Survivors keep their relative order.
    pub fn remove<F>(&mut self, mut predicate: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.items.retain(|item| !predicate(item));
    }

    /// Number of items currently held.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a capacity is set and the collection has reached it.
    pub fn is_full(&self) -> bool {
        self.max_size.is_some_and(|max| self.items.len() >= max)
    }
}

impl<T: Clone> Bounded<T> {
    /// Return an independent copy of the sequence, front to back.
    ///
    /// Mutating the returned vector never affects the collection.
    pub fn items(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

/// A bounded LIFO stack: push, pop and peek all act on the back.
#[derive(Debug, Clone)]
pub struct Stack<T>(Bounded<T>);

impl<T> Stack<T> {
    /// Create an empty stack with an optional capacity.
    pub fn new(max_size: Option<usize>) -> Self {
        Self(Bounded::new(max_size))
    }

    /// Create a stack seeded with `items` (bottom first).
    pub fn with_items(items: Vec<T>, max_size: Option<usize>) -> Self {
        Self(Bounded::with_items(items, max_size))
    }

    /// Push an item; rejected with `false` when full.
    pub fn push(&mut self, item: T) -> bool {
        self.0.insert(item)
    }

    /// Remove and return the most recently pushed item.
    pub fn pop(&mut self) -> Option<T> {
        self.0.take_back()
    }

    /// Peek at the most recently pushed item.
    pub fn peek(&self) -> Option<&T> {
        self.0.back()
    }

    /// Empty the stack.
    pub fn clear(&mut self) {
        self.0.clear()
    }

    /// Remove every element the predicate matches, keeping survivor order.
    pub fn remove<F: FnMut(&T) -> bool>(&mut self, predicate: F) {
        self.0.remove(predicate)
    }

    /// Number of items on the stack.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the stack has reached its capacity.
    pub fn is_full(&self) -> bool {
        self.0.is_full()
    }
}

impl<T: Clone> Stack<T> {
    /// Independent copy of the stack, bottom first.
    pub fn items(&self) -> Vec<T> {
        self.0.items()
    }
}

/// A bounded FIFO queue: enqueue at the back, dequeue and peek at the front.
#[derive(Debug, Clone)]
pub struct Queue<T>(Bounded<T>);

impl<T> Queue<T> {
    /// Create an empty queue with an optional capacity.
    pub fn new(max_size: Option<usize>) -> Self {
        Self(Bounded::new(max_size))
    }

    /// Create a queue seeded with `items` (front first).
    pub fn with_items(items: Vec<T>, max_size: Option<usize>) -> Self {
        Self(Bounded::with_items(items, max_size))
    }

    /// Enqueue an item; rejected with `false` when full.
    pub fn enqueue(&mut self, item: T) -> bool {
        self.0.insert(item)
    }

    /// Remove and return the oldest item.
    pub fn dequeue(&mut self) -> Option<T> {
        self.0.take_front()
    }

    /// Peek at the oldest item.
    pub fn peek(&self) -> Option<&T> {
        self.0.front()
    }

    /// Empty the queue.
    pub fn clear(&mut self) {
        self.0.clear()
    }

    /// Remove every element the predicate matches, keeping survivor order.
    pub fn remove<F: FnMut(&T) -> bool>(&mut self, predicate: F) {
        self.0.remove(predicate)
    }

    /// Number of items in the queue.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the queue has reached its capacity.
    pub fn is_full(&self) -> bool {
        self.0.is_full()
    }
}

impl<T: Clone> Queue<T> {
    /// Independent copy of the queue, front first.
    pub fn items(&self) -> Vec<T> {
        self.0.items()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_is_lifo() {
        let mut stack = Stack::new(None);
        for n in 1..=4 {
            assert!(stack.push(n));
        }
        assert_eq!(stack.peek(), Some(&4));
        assert_eq!(stack.pop(), Some(4));
        assert_eq!(stack.pop(), Some(3));
        assert_eq!(stack.pop(), Some(2));
        assert_eq!(stack.pop(), Some(1));
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn queue_is_fifo() {
        let mut queue = Queue::new(None);
        for n in 1..=4 {
            assert!(queue.enqueue(n));
        }
        assert_eq!(queue.peek(), Some(&1));
        assert_eq!(queue.dequeue(), Some(1));
        assert_eq!(queue.dequeue(), Some(2));
        assert_eq!(queue.dequeue(), Some(3));
        assert_eq!(queue.dequeue(), Some(4));
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn capacity_rejects_third_insert() {
        let mut queue = Queue::new(Some(2));
        assert!(queue.enqueue("a"));
        assert!(queue.enqueue("b"));
        assert!(queue.is_full());

        assert!(!queue.enqueue("c"));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.items(), vec!["a", "b"]);
    }

    #[test]
    fn oversized_seed_is_accepted_whole() {
        let mut stack = Stack::with_items(vec![1, 2, 3], Some(2));
        assert_eq!(stack.len(), 3);
        assert!(stack.is_full());

        // Subsequent inserts are still capacity-checked.
        assert!(!stack.push(4));
        assert_eq!(stack.items(), vec![1, 2, 3]);
    }

    #[test]
    fn pop_and_peek_on_empty_return_none() {
        let mut stack: Stack<u8> = Stack::new(Some(4));
        assert!(stack.is_empty());
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.peek(), None);
    }

    #[test]
    fn clear_empties_unconditionally() {
        let mut queue = Queue::with_items(vec![1, 2, 3], None);
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn remove_keeps_survivor_order() {
        let mut queue = Queue::with_items(vec![1, 2, 3, 4, 5, 6], None);
        queue.remove(|n| n % 2 == 0);
        assert_eq!(queue.items(), vec![1, 3, 5]);
    }

    #[test]
    fn remove_frees_capacity() {
        let mut stack = Stack::with_items(vec![1, 2], Some(2));
        assert!(stack.is_full());
        stack.remove(|n| *n == 1);
        assert!(!stack.is_full());
        assert!(stack.push(3));
        assert_eq!(stack.items(), vec![2, 3]);
    }

    #[test]
    fn items_is_a_defensive_copy() {
        let queue = Queue::with_items(vec![1, 2, 3], None);
        let mut copy = queue.items();
        copy.push(99);
        copy.remove(0);
        assert_eq!(queue.items(), vec![1, 2, 3]);
    }

    #[test]
    fn seed_then_dequeue_then_enqueue() {
        let mut queue = Queue::with_items(vec![1, 2, 3], None);
        assert_eq!(queue.dequeue(), Some(1));
        assert_eq!(queue.dequeue(), Some(2));
        assert!(queue.enqueue(4));
        assert_eq!(queue.items(), vec![3, 4]);
    }
}
