//! Image-space selection for `dall-e-3` requests.
//!
//! The bearer token picks a space; each space has its own static style and
//! sampler tables. Generation transports are not part of this crate.

pub mod tags;

use rand::seq::IndexedRandom;

pub const IMAGE_MODEL: &str = "dall-e-3";

const FALLBACK_SAMPLER: &str = "Euler a";
const NONE: &str = "none";

const SD_MODELS: &[&str] = &[
    "absolutereality_v181.safetensors [3d9d4d2b]",
    "anythingV5_PrtRE.safetensors [893e49b9]",
    "deliberate_v3.safetensors [afd9d2d4]",
    "dreamshaper_8.safetensors [9d40847d]",
    "meinamix_meinaV11.safetensors [b56ce717]",
    "realisticVisionV51_v51VAE.safetensors [15012c538f]",
    "revAnimated_v122.safetensors [3f4fefd9]",
];

const SD_SAMPLES: &[&str] = &[
    "DPM++ 2M Karras",
    "DPM++ SDE Karras",
    "DPM++ 2M SDE Exponential",
    "DPM++ 2M SDE Karras",
    "Euler a",
    "Euler",
    "LMS",
    "Heun",
    "DDIM",
];

const XL_MODELS: &[&str] = &[
    "animagineXLV3_v30.safetensors [75f2f05b]",
    "devlishphotorealism_sdxl15.safetensors [77cba69f]",
    "dreamshaperXL10_alpha2.safetensors [c8afe2ef]",
    "juggernautXL_v45.safetensors [e75f5471]",
    "realismEngineSDXL_v10.safetensors [af771c3f]",
    "sd_xl_base_1.0.safetensors [be9edd61]",
];

const XL_SAMPLES: &[&str] = &[
    "DPM++ 2M Karras",
    "DPM++ SDE Karras",
    "DPM++ 2M SDE Exponential",
    "DPM++ 2M SDE Karras",
    "Euler a",
    "Euler",
    "LMS",
    "Heun",
    "DDIM",
];

const DALLE4K_MODELS: &[&str] = &[
    "(No style)",
    "Cinematic",
    "Photographic",
    "Anime",
    "Manga",
    "Digital Art",
    "Pixel art",
    "Fantasy art",
    "Neonpunk",
    "3D Model",
];

const GOOGLE_MODELS: &[&str] = &[
    "imagen-3.0-generate-001",
    "imagen-3.0-fast-generate-001",
];

const ANIMAGINE_XL31_MODELS: &[&str] = &[
    "(None)",
    "Cinematic",
    "Photographic",
    "Anime",
    "Manga",
    "Digital Art",
    "Pixel art",
    "Fantasy art",
    "Neonpunk",
    "3D Model",
];

const ANIMAGINE_XL31_SAMPLES: &[&str] = &[
    "DPM++ 2M Karras",
    "DPM++ SDE Karras",
    "DPM++ 2M SDE Karras",
    "Euler",
    "Euler a",
    "DDIM",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSpace {
    ProdiaSd,
    ProdiaXl,
    Google,
    Dalle4k,
    Dalle3Xl,
    AnimagineXl31,
}

impl ImageSpace {
    /// Picks the space a `dall-e-3` request is routed to; other models get none.
    pub fn select(model: &str, token: &str) -> Option<Self> {
        if model != IMAGE_MODEL {
            return None;
        }
        match token {
            "sk-prodia-sd" => Some(ImageSpace::ProdiaSd),
            "sk-prodia-xl" => Some(ImageSpace::ProdiaXl),
            "sk-google-xl" => Some(ImageSpace::Google),
            "sk-dalle-4k" => Some(ImageSpace::Dalle4k),
            "sk-dalle-3-xl" => Some(ImageSpace::Dalle3Xl),
            "sk-animagine-xl-3.1" => Some(ImageSpace::AnimagineXl31),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ImageSpace::ProdiaSd => "prodia-sd",
            ImageSpace::ProdiaXl => "prodia-xl",
            ImageSpace::Google => "google",
            ImageSpace::Dalle4k => "dalle-4k",
            ImageSpace::Dalle3Xl => "dalle-3xl",
            ImageSpace::AnimagineXl31 => "animagine-xl-3.1",
        }
    }

    /// Styles advertised for the space.
    pub fn models(self) -> &'static [&'static str] {
        match self {
            ImageSpace::ProdiaSd => SD_MODELS,
            ImageSpace::ProdiaXl => XL_MODELS,
            ImageSpace::Google => GOOGLE_MODELS,
            ImageSpace::Dalle4k => DALLE4K_MODELS,
            ImageSpace::Dalle3Xl => &[],
            ImageSpace::AnimagineXl31 => ANIMAGINE_XL31_MODELS,
        }
    }

    /// Samplers advertised for the space.
    pub fn samples(self) -> &'static [&'static str] {
        match self {
            ImageSpace::ProdiaSd => SD_SAMPLES,
            ImageSpace::ProdiaXl => XL_SAMPLES,
            ImageSpace::AnimagineXl31 => ANIMAGINE_XL31_SAMPLES,
            ImageSpace::Google | ImageSpace::Dalle4k | ImageSpace::Dalle3Xl => &[],
        }
    }

    /// The requested style if listed, else a random listed one.
    pub fn match_model(self, style: &str) -> String {
        if self == ImageSpace::Dalle3Xl {
            return NONE.to_string();
        }
        let models = self.models();
        if models.contains(&style) {
            return style.to_string();
        }
        models
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(NONE)
            .to_string()
    }

    /// The requested sampler if listed, else `Euler a`.
    ///
    /// Spaces without their own sampler table are checked against the
    /// stable-diffusion one.
    pub fn match_samples(self, quality: &str) -> String {
        let table = match self {
            ImageSpace::Dalle3Xl => return NONE.to_string(),
            ImageSpace::ProdiaXl => XL_SAMPLES,
            ImageSpace::AnimagineXl31 => ANIMAGINE_XL31_SAMPLES,
            ImageSpace::ProdiaSd | ImageSpace::Google | ImageSpace::Dalle4k => SD_SAMPLES,
        };
        if table.contains(&quality) {
            quality.to_string()
        } else {
            FALLBACK_SAMPLER.to_string()
        }
    }

    /// Spaces fed a natural-language sentence rather than a tag list.
    pub fn wants_sentence(self) -> bool {
        matches!(self, ImageSpace::Dalle4k | ImageSpace::Dalle3Xl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_selects_space_only_for_dalle3() {
        assert_eq!(ImageSpace::select("dall-e-3", "sk-prodia-xl"), Some(ImageSpace::ProdiaXl));
        assert_eq!(
            ImageSpace::select("dall-e-3", "sk-animagine-xl-3.1").map(ImageSpace::name),
            Some("animagine-xl-3.1")
        );
        assert_eq!(ImageSpace::select("dall-e-2", "sk-prodia-xl"), None);
        assert_eq!(ImageSpace::select("dall-e-3", "sk-unknown"), None);
    }

    #[test]
    fn listed_style_is_kept() {
        let style = XL_MODELS[2];
        assert_eq!(ImageSpace::ProdiaXl.match_model(style), style);
        assert_eq!(ImageSpace::Dalle3Xl.match_model(style), "none");
    }

    #[test]
    fn unknown_style_falls_back_to_table() {
        for space in [ImageSpace::ProdiaSd, ImageSpace::Google, ImageSpace::Dalle4k] {
            let picked = space.match_model("not-a-style");
            assert!(space.models().contains(&picked.as_str()), "{picked}");
        }
    }

    #[test]
    fn samplers() {
        assert_eq!(ImageSpace::ProdiaSd.match_samples("DDIM"), "DDIM");
        assert_eq!(ImageSpace::AnimagineXl31.match_samples("Heun"), "Euler a");
        assert_eq!(ImageSpace::Google.match_samples("LMS"), "LMS");
        assert_eq!(ImageSpace::Dalle3Xl.match_samples("DDIM"), "none");
    }
}
