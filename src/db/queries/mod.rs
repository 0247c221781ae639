pub mod products;
pub mod seed;
pub mod showcases;
pub mod sweeps;
pub mod type_hints;
pub mod wishlists;
