//! Per-persona image prompts.
//!
//! The upstream image service refuses prompts that name gender or ethnicity,
//! so prompts describe only age band, profession, styling and setting.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

use crate::persona::{PersonaField, PersonaView};

const HAIR_STYLES: &[&str] = &[
    "short neat hair",
    "shoulder-length hair",
    "curly hair",
    "wavy hair pulled back",
    "closely cropped hair",
    "long straight hair",
    "natural textured hair",
    "silver-streaked hair",
];

const ATTIRE: &[&str] = &[
    "a navy blazer over an open-collar shirt",
    "a charcoal suit",
    "a smart casual sweater",
    "a crisp white button-down",
    "a tailored jacket",
    "business casual attire",
    "a quarter-zip pullover",
    "a structured cardigan",
];

const SETTINGS: &[&str] = &[
    "a bright modern office",
    "a collaborative workspace",
    "a campus atrium",
    "a warehouse operations floor",
];

/// Age band phrase from the lower bound of an `"NN-NN"` range.
pub fn age_description(age_range: &str) -> &'static str {
    let first = age_range
        .split('-')
        .next()
        .and_then(|s| s.trim().parse::<u32>().ok());
    match first {
        Some(age) if age < 28 => "mid-20s",
        Some(age) if age < 35 => "early 30s",
        Some(age) if age < 42 => "late 30s",
        Some(_) => "40s",
        None => "30s",
    }
}

/// RNG seeded from the SHA-256 digest of `key`.
pub fn seeded_rng(key: &str) -> StdRng {
    let digest = Sha256::digest(key.as_bytes());
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&digest);
    StdRng::from_seed(seed)
}

/// Build the image prompt for one persona.
///
/// Hair style is stable per name; attire comes from `rng` so repeated
/// requests for similar personas still differ.
pub fn build_image_prompt<P, R>(persona: &P, rng: &mut R) -> String
where
    P: PersonaView + ?Sized,
    R: Rng + ?Sized,
{
    let name = persona.text(PersonaField::Name).unwrap_or_default();
    let occupation = persona
        .text(PersonaField::Occupation)
        .filter(|s| !s.is_empty())
        .unwrap_or("professional");
    let industry = persona.text(PersonaField::Industry).filter(|s| !s.is_empty());
    let age = age_description(persona.text(PersonaField::AgeRange).unwrap_or_default());

    let hair = HAIR_STYLES
        .choose(&mut seeded_rng(name))
        .copied()
        .unwrap_or(HAIR_STYLES[0]);
    let attire = ATTIRE.choose(rng).copied().unwrap_or(ATTIRE[0]);
    let setting = SETTINGS.choose(rng).copied().unwrap_or(SETTINGS[0]);

    let role = match industry {
        Some(industry) => format!("{} working in {}", occupation, industry),
        None => occupation.to_string(),
    };

    format!(
        "Professional headshot photograph of a {} in their {}, {}, wearing {}, \
         photographed in {}. Natural lighting, friendly confident expression, \
         shallow depth of field, photorealistic, no text or logos.",
        role, age, hair, attire, setting
    )
}
