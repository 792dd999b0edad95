//! Bimatrix games and the algorithms that compute their Nash equilibria.
mod bimatrix_game;
pub use self::bimatrix_game::*;

mod lemke_howson;
pub use self::lemke_howson::*;

mod support_enumeration;
pub use self::support_enumeration::*;

mod game_error;
pub use game_error::GameError;
