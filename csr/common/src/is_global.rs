/// Bounds for values that are shared by all the request handlers of a server.
pub trait IsGlobal: Send + Sync + 'static {}

impl<C: Send + Sync + 'static> IsGlobal for C {}
