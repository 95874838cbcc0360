pub mod ambiguity;
pub mod intent;
pub mod normalize;
pub mod pin;
pub mod preprocess;
pub mod sanitize;
pub mod segment;
