use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(ImageId);
id_newtype!(UserId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    DigitalArt,
    Photography,
    Painting,
    Illustration,
    #[serde(rename = "3d")]
    ThreeD,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::DigitalArt,
        Category::Photography,
        Category::Painting,
        Category::Illustration,
        Category::ThreeD,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::DigitalArt => "digital-art",
            Category::Photography => "photography",
            Category::Painting => "painting",
            Category::Illustration => "illustration",
            Category::ThreeD => "3d",
            Category::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::DigitalArt => "Digital Art",
            Category::Photography => "Photography",
            Category::Painting => "Painting",
            Category::Illustration => "Illustration",
            Category::ThreeD => "3D Art",
            Category::Other => "Other",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
