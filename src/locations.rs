/// Recognized review locations.
///
/// Submissions must name one of these, and a location-filtered listing never
/// surfaces reviews from outside the set.
pub const ALLOWED_LOCATIONS: [&str; 18] = [
    "Albuquerque, New Mexico",
    "Carlsbad, California",
    "Chula Vista, California",
    "Colorado Springs, Colorado",
    "Denver, Colorado",
    "El Cajon, California",
    "El Paso, Texas",
    "Escondido, California",
    "Fresno, California",
    "La Mesa, California",
    "Las Vegas, Nevada",
    "Los Angeles, California",
    "Oceanside, California",
    "Phoenix, Arizona",
    "Sacramento, California",
    "Salt Lake City, Utah",
    "San Diego, California",
    "Tucson, Arizona",
];

pub fn is_allowed(location: &str) -> bool {
    ALLOWED_LOCATIONS.contains(&location)
}
