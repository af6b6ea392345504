pub mod gaps;
pub mod highlight;
pub mod hull;
pub mod interaction;
pub mod layout;
pub mod scene;
pub mod selector;
pub mod sizing;
