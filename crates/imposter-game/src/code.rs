//! Room code generation.
//!
//! Generation is a pure function of the random source. Uniqueness among
//! live rooms is the registry's job: it checks the code against what it
//! holds and asks again on collision.

use imposter_protocol::RoomCode;
use rand::Rng;

/// Draws a random code from [`RoomCode::ALPHABET`].
pub fn generate_room_code<R: Rng + ?Sized>(rng: &mut R) -> RoomCode {
    let alphabet_len = RoomCode::ALPHABET.len();
    RoomCode::from_indices(std::array::from_fn(|_| rng.random_range(0..alphabet_len)))
}
