/// Controls panel shown in the butterfly scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instructions {
    pub heading: &'static str,
    pub bullets: &'static [&'static str],
}

impl Instructions {
    pub const BUTTERFLY: Instructions = Instructions {
        heading: "Controls:",
        bullets: &[
            "Use arrow keys to control the butterfly",
            "Explore the magical world around you",
        ],
    };

    /// Plain-text rendering, one bullet per line.
    pub fn lines(&self) -> Vec<String> {
        std::iter::once(self.heading.to_string())
            .chain(self.bullets.iter().map(|b| format!("• {b}")))
            .collect()
    }
}

/// Label shown while models load.
pub fn loader_label(percent: u32) -> String {
    format!("{}% loaded", percent.min(100))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn butterfly_instructions() {
        let lines = Instructions::BUTTERFLY.lines();
        assert_eq!(lines[0], "Controls:");
        assert_eq!(lines[1], "• Use arrow keys to control the butterfly");
        assert_eq!(lines[2], "• Explore the magical world around you");
    }

    #[test]
    fn loader_label_is_whole_percent() {
        assert_eq!(loader_label(0), "0% loaded");
        assert_eq!(loader_label(42), "42% loaded");
        assert_eq!(loader_label(250), "100% loaded");
    }
}
