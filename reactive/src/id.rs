use slotmap::new_key_type;

new_key_type! {
    /// Stable identifier of a [`Dep`](crate::Dep) record in a runtime.
    pub struct DepId;

    /// Stable identifier of a [`Watcher`](crate::Watcher) record in a runtime.
    pub struct WatcherId;
}
