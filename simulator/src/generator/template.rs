use rand::seq::SliceRandom;
use rand::Rng;

const PREFIXES: [&str; 8] = [
    "NORDIC", "MAERSK", "STENA", "OCEAN", "ATLANTIC", "BALTIC", "HOLLAND", "NORTHERN",
];
const STEMS: [&str; 10] = [
    "SPIRIT", "STAR", "TRADER", "EXPRESS", "PIONEER", "BREEZE", "VOYAGER", "CARRIER", "HOPE",
    "WAVE",
];
const DESTINATIONS: [&str; 8] = [
    "ROTTERDAM", "ANTWERP", "HAMBURG", "FELIXSTOWE", "IJMUIDEN", "DOVER", "LE HAVRE", "BREMEN",
];
/// Flag state and the matching maritime identification digits.
pub const FLAGS: [(&str, u32); 5] = [
    ("NL", 244),
    ("BE", 205),
    ("DE", 211),
    ("GB", 232),
    ("NO", 257),
];

pub fn vessel_name<R: Rng>(rng: &mut R) -> String {
    let prefix = PREFIXES.choose(rng).copied().unwrap_or("NORDIC");
    let stem = STEMS.choose(rng).copied().unwrap_or("STAR");
    if rng.gen_bool(0.3) {
        format!("{} {} {}", prefix, stem, rng.gen_range(1..10))
    } else {
        format!("{} {}", prefix, stem)
    }
}

pub fn callsign<R: Rng>(rng: &mut R, country: &str) -> String {
    let letters: String = (0..2)
        .map(|_| char::from(b'A' + rng.gen_range(0..26u8)))
        .collect();
    let initial = country.chars().next().unwrap_or('X');
    format!("{}{}{}", initial, letters, rng.gen_range(10..100))
}

pub fn destination<R: Rng>(rng: &mut R) -> String {
    DESTINATIONS
        .choose(rng)
        .copied()
        .unwrap_or("ROTTERDAM")
        .to_string()
}
