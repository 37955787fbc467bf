pub mod dialog;
pub mod interceptor;
pub mod overlay;
pub mod pipeline;
pub mod state;
pub mod store;
pub mod types;
