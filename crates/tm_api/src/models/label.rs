use std::fmt;

/// Label operation of an issue partial update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelAction {
    Add,
    Remove,
}

impl LabelAction {
    /// Key used inside the `labels` update array.
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelAction::Add => "add",
            LabelAction::Remove => "remove",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            LabelAction::Add => "added",
            LabelAction::Remove => "removed",
        }
    }

    pub fn preposition(&self) -> &'static str {
        match self {
            LabelAction::Add => "to",
            LabelAction::Remove => "from",
        }
    }
}

impl fmt::Display for LabelAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LabelAction {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(LabelAction::Add),
            "remove" => Ok(LabelAction::Remove),
            other => Err(format!("unknown label action: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LabelAction;

    #[test]
    fn display_words_match_action() {
        assert_eq!(LabelAction::Add.to_string(), "add");
        assert_eq!(LabelAction::Remove.past_tense(), "removed");
        assert_eq!(LabelAction::Remove.preposition(), "from");
        assert_eq!("REMOVE".parse::<LabelAction>(), Ok(LabelAction::Remove));
        assert!("toggle".parse::<LabelAction>().is_err());
    }
}
