pub mod errors;
pub mod usecases;

#[cfg(test)]
mod tests;
