use std::io;

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Model used for prompt suggestion and result analysis.
    pub text_model: String,
    /// Model used for masked-image generation.
    pub image_model: String,
    pub viewport: [f32; 2],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            text_model: "gemini-2.5-flash".into(),
            image_model: "gemini-2.5-flash-image-preview".into(),
            viewport: [1000.0, 800.0],
        }
    }
}

impl Config {
    /// Reads `config.json` next to the executable; absence is not an error.
    pub fn load() -> io::Result<Self> {
        match std::fs::File::open("config.json") {
            Ok(f) => serde_json::from_reader(f)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }
}
