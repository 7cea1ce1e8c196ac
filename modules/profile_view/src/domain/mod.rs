pub mod avatar;
pub mod forms;
pub mod preview;
pub mod session;
pub mod state;
pub mod view_model;
