//! Observable state containers the presentation layer subscribes to.

use tokio::sync::watch;

/// Latest-value holder backed by a [`watch`] channel.
///
/// Writers replace the value; every subscriber sees the newest snapshot.
/// Sending never fails, even with no subscriber attached.
#[derive(Debug)]
pub struct Observable<T> {
    tx: watch::Sender<T>,
}

impl<T> Observable<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Mutate in place and notify subscribers once.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone> Observable<T> {
    /// Clone of the current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_sees_latest_value() {
        let state = Observable::new(Vec::<u32>::new());
        let mut rx = state.subscribe();

        state.set(vec![1]);
        state.set(vec![1, 2]);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), vec![1, 2]);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_update_in_place() {
        let state: Observable<Vec<u32>> = Observable::default();
        state.update(|v| v.push(7));
        assert_eq!(state.get(), vec![7]);
    }
}
