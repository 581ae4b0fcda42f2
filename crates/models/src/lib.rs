pub mod errors;
pub mod db;
pub mod icon;

#[cfg(test)]
mod tests;
