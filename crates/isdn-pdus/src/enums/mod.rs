pub mod bearer_capability;
pub mod event;
pub mod ie_tag;
pub mod number_type;
