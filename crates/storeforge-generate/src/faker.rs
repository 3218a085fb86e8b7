//! Personal and descriptive field values drawn from `fake`.
//!
//! Every function takes the caller's RNG so seeded runs stay reproducible.

use fake::Fake;
use fake::faker::address::en::{BuildingNumber, CityName, StateAbbr, StreetName, ZipCode};
use fake::faker::company::en::CatchPhrase;
use fake::faker::internet::en::FreeEmailProvider;
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber;
use rand::Rng;

pub fn first_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    FirstName().fake_with_rng(rng)
}

pub fn last_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    LastName().fake_with_rng(rng)
}

/// Email derived from the person's name, numbered by row to stay unique.
pub fn email<R: Rng + ?Sized>(rng: &mut R, first: &str, last: &str, index: u64) -> String {
    let provider: String = FreeEmailProvider().fake_with_rng(rng);
    let local: String = format!("{first}.{last}")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
        .collect::<String>()
        .to_lowercase();
    format!("{local}{index}@{provider}")
}

pub fn phone<R: Rng + ?Sized>(rng: &mut R) -> String {
    PhoneNumber().fake_with_rng(rng)
}

pub fn street_address<R: Rng + ?Sized>(rng: &mut R) -> String {
    let number: String = BuildingNumber().fake_with_rng(rng);
    let street: String = StreetName().fake_with_rng(rng);
    format!("{number} {street}")
}

pub fn city<R: Rng + ?Sized>(rng: &mut R) -> String {
    CityName().fake_with_rng(rng)
}

pub fn state<R: Rng + ?Sized>(rng: &mut R) -> String {
    StateAbbr().fake_with_rng(rng)
}

pub fn zip_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    ZipCode().fake_with_rng(rng)
}

pub fn catch_phrase<R: Rng + ?Sized>(rng: &mut R) -> String {
    CatchPhrase().fake_with_rng(rng)
}

pub fn description<R: Rng + ?Sized>(rng: &mut R) -> String {
    Sentence(6..14).fake_with_rng(rng)
}
