use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Gender {
    M,
    F,
}

impl Gender {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "M" | "m" => Some(Self::M),
            "F" | "f" => Some(Self::F),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::M => "M",
            Self::F => "F",
        }
    }

    pub fn pronoun(self) -> &'static str {
        match self {
            Self::M => "he",
            Self::F => "she",
        }
    }

    pub fn adjective(self) -> &'static str {
        match self {
            Self::M => "his",
            Self::F => "her",
        }
    }
}

/// Skills-and-assessment grade. `X` is the ungraded sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    X,
}

impl Grade {
    pub const LETTERS: [Grade; 4] = [Grade::A, Grade::B, Grade::C, Grade::D];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            "X" => Some(Self::X),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::X => "X",
        }
    }

    pub fn is_ungraded(self) -> bool {
        self == Self::X
    }
}

/// Personal-development rating, 1..=5. A raw value of 0 means ungraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PdRating(pub u8);

impl PdRating {
    pub const UNGRADED: PdRating = PdRating(0);

    pub fn is_ungraded(self) -> bool {
        self.0 == 0
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            5 => "Excellent",
            4 => "Very Good",
            3 => "Good",
            2 => "Satisfactory",
            1 => "Needs Improvement",
            _ => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    /// Transition used when a long list is broken into a fresh sentence.
    pub fn conjunction(self) -> &'static str {
        match self {
            Self::Positive => "In addition",
            Self::Negative => "Besides",
        }
    }

    /// Connector that introduces the trailing sentence of a 4-5 item list.
    pub fn closing_connector(self) -> Option<&'static str> {
        match self {
            Self::Positive => None,
            Self::Negative => Some("Further"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub polarity: Polarity,
}

impl Fragment {
    pub fn positive(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            polarity: Polarity::Positive,
        }
    }

    pub fn negative(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            polarity: Polarity::Negative,
        }
    }
}
