use serde::{Deserialize, Serialize};

use crate::domain::transcription::Transcript;

/// Plain lyrics text split into displayable lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LyricSheet {
    lines: Vec<String>,
}

/// A lyric line with its playback window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedLine {
    pub text: String,
    pub start_ms: u64,
    pub end_ms: u64,
}

/// Lyric lines aligned against a transcript, ordered by start time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimedLyrics {
    lines: Vec<TimedLine>,
}

#[derive(Debug, Clone, Copy)]
struct TimedWord {
    start_ms: u64,
    end_ms: u64,
}

impl LyricSheet {
    /// Blank lines and surrounding whitespace are dropped.
    pub fn parse(text: &str) -> Self {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Assign each line a window by consuming as many transcript words as the
    /// line has words, in order. Lines left over once the transcript runs out
    /// of words share the remaining tail evenly.
    pub fn align(&self, transcript: &Transcript) -> TimedLyrics {
        let words = word_timeline(transcript);
        let mut lines = Vec::with_capacity(self.lines.len());
        let mut next_word = 0;
        let mut last_end = 0;

        for text in &self.lines {
            if next_word >= words.len() {
                break;
            }
            let wanted = text.split_whitespace().count().max(1);
            let taken = &words[next_word..(next_word + wanted).min(words.len())];
            next_word += taken.len();

            let start_ms = taken[0].start_ms.max(last_end);
            let end_ms = taken[taken.len() - 1].end_ms.max(start_ms);
            last_end = end_ms;
            lines.push(TimedLine {
                text: text.clone(),
                start_ms,
                end_ms,
            });
        }

        let remaining = &self.lines[lines.len()..];
        if !remaining.is_empty() {
            let tail_end = transcript.end_ms().max(last_end);
            let share = (tail_end - last_end) / remaining.len() as u64;
            for (i, text) in remaining.iter().enumerate() {
                let start_ms = last_end + share * i as u64;
                let end_ms = if i + 1 == remaining.len() {
                    tail_end
                } else {
                    start_ms + share
                };
                lines.push(TimedLine {
                    text: text.clone(),
                    start_ms,
                    end_ms,
                });
            }
        }

        TimedLyrics { lines }
    }
}

impl TimedLyrics {
    pub fn lines(&self) -> &[TimedLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Index of the line being sung at `position_ms`, or None before the first line.
    pub fn line_at(&self, position_ms: u64) -> Option<usize> {
        self.lines
            .partition_point(|line| line.start_ms <= position_ms)
            .checked_sub(1)
    }

    pub fn current_line(&self, position_ms: u64) -> Option<&TimedLine> {
        self.line_at(position_ms).map(|i| &self.lines[i])
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Spread each segment's span across its words in proportion to word length.
fn word_timeline(transcript: &Transcript) -> Vec<TimedWord> {
    let mut timeline = Vec::new();

    for segment in &transcript.segments {
        let words: Vec<&str> = segment.text.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        let weights: Vec<u64> = words
            .iter()
            .map(|w| w.chars().count().max(1) as u64)
            .collect();
        let total: u64 = weights.iter().sum();
        let span = segment.end_ms.saturating_sub(segment.start_ms);

        let mut consumed = 0;
        for weight in weights {
            let start_ms = segment.start_ms + span * consumed / total;
            consumed += weight;
            let end_ms = segment.start_ms + span * consumed / total;
            timeline.push(TimedWord { start_ms, end_ms });
        }
    }

    timeline
}
