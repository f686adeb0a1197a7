pub mod assistant;
pub mod execute;
pub mod read;
pub mod write;

#[derive(serde::Deserialize)]
struct Variant {
  variant: String,
}
