pub mod detach;
pub mod orchestrate;
pub mod reap;
