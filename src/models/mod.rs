pub mod card;
pub mod deck;
pub mod game;
pub mod set;
pub mod sub;

pub use card::*;
pub use deck::*;
pub use game::*;
pub use set::*;
pub use sub::*;
