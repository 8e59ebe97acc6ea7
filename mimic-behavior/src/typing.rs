use crate::error::{InteractionExt, Result};
use crate::pacer::Pacer;
use crate::page::{Key, PageAutomation};
use crate::random::RandomSource;
use mimic_common::StealthConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const TYPO_PROBABILITY: f64 = 0.05;
const REREAD_PROBABILITY: f64 = 0.1;
const RETYPE_PROBABILITY: f64 = 0.15;
const TYPO_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Types text the way a person does: uneven keystroke rhythm, occasional
/// wrong letters that get corrected, and the odd word partly erased and
/// retyped.
pub struct TypingController<P: PageAutomation> {
    page: Arc<P>,
    rng: Box<dyn RandomSource>,
    pacer: Pacer,
}

impl<P: PageAutomation> TypingController<P> {
    pub fn new(
        page: Arc<P>,
        config: &StealthConfig,
        pacer: Pacer,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self { page, rng, pacer })
    }

    /// Focus `element` and type `text` one character at a time.
    pub async fn type_text(&mut self, element: &P::Element, text: &str) -> Result<()> {
        self.pacer.checkpoint()?;
        self.page.focus(element).await.during("focus")?;
        let settle = self.rng.millis(300, 700);
        self.pacer.pause(settle).await?;

        let total = text.chars().count();
        let mut typos = 0usize;
        let mut buf = [0u8; 4];
        for (position, ch) in text.chars().enumerate() {
            if position + 1 < total && self.rng.chance(TYPO_PROBABILITY) {
                let wrong = TYPO_ALPHABET[self.rng.below(TYPO_ALPHABET.len() as u64) as usize];
                self.input(&(wrong as char).to_string()).await?;
                let notice = self.rng.millis(200, 400);
                self.pacer.pause(notice).await?;
                self.backspace().await?;
                let recover = self.rng.millis(100, 200);
                self.pacer.pause(recover).await?;
                typos += 1;
            }

            self.input(ch.encode_utf8(&mut buf)).await?;
            let delay = keystroke_delay(self.rng.as_mut(), ch, position);
            self.pacer.pause(delay).await?;
        }

        debug!(target: "behavior.typing", chars = total, typos, "typed text");
        Ok(())
    }

    /// Type word by word, sometimes erasing the tail of a word and
    /// retyping it.
    pub async fn type_with_backspace_bursts(
        &mut self,
        element: &P::Element,
        text: &str,
    ) -> Result<()> {
        let words: Vec<&str> = text.split_whitespace().collect();
        for (index, word) in words.iter().enumerate() {
            self.type_text(element, word).await?;

            let len = word.chars().count();
            if len > 3 && self.rng.chance(RETYPE_PROBABILITY) {
                let erase = 1 + self.rng.below(3) as usize;
                for _ in 0..erase {
                    self.backspace().await?;
                    let gap = self.rng.millis(80, 120);
                    self.pacer.pause(gap).await?;
                }
                let tail: String = word.chars().skip(len - erase).collect();
                debug!(target: "behavior.typing", erased = erase, "retyping word tail");
                self.type_text(element, &tail).await?;
            }

            if index + 1 < words.len() {
                self.input(" ").await?;
                let gap = self.rng.millis(100, 150);
                self.pacer.pause(gap).await?;
            }
        }
        Ok(())
    }

    /// Replace the field's current content with `text`.
    pub async fn fill_field(&mut self, element: &P::Element, text: &str) -> Result<()> {
        self.pacer.checkpoint()?;
        self.page.select_all(element).await.during("select all")?;
        let pause = self.rng.millis(50, 100);
        self.pacer.pause(pause).await?;
        self.backspace().await?;
        self.type_text(element, text).await
    }

    async fn input(&self, text: &str) -> Result<()> {
        self.pacer.checkpoint()?;
        self.page.input_text(text).await.during("input text")
    }

    async fn backspace(&self) -> Result<()> {
        self.pacer.checkpoint()?;
        self.page
            .press_key(Key::Backspace)
            .await
            .during("press backspace")
    }
}

/// Pause after typing `ch` at `position` (0-based).
///
/// Base rhythm is 80–150 ms; spaces, punctuation and newlines add their own
/// hesitation, the first five characters are slower, and one keystroke in
/// ten is followed by a longer rereading pause.
pub fn keystroke_delay(rng: &mut dyn RandomSource, ch: char, position: usize) -> Duration {
    let mut ms = 80 + rng.below(70);
    match ch {
        ' ' => ms += rng.below(30),
        '.' | ',' | '!' | '?' => ms += rng.below(100),
        '\n' => ms += 200 + rng.below(300),
        _ => {}
    }
    if position < 5 {
        ms += rng.below(50);
    }
    if rng.chance(REREAD_PROBABILITY) {
        ms += 200 + rng.below(500);
    }
    Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BehaviorError;
    use crate::page::BoundingBox;
    use crate::random::{seeded, FixedSequence};
    use crate::testing::{manual_pacer, FakeElement, PageCall, RecordingPage};

    fn field() -> FakeElement {
        FakeElement::new("message", BoundingBox::new(0.0, 0.0, 300.0, 40.0))
    }

    fn controller(
        page: Arc<RecordingPage>,
        pacer: Pacer,
        rng: Box<dyn RandomSource>,
    ) -> TypingController<RecordingPage> {
        TypingController::new(page, &StealthConfig::default(), pacer, rng).unwrap()
    }

    #[test]
    fn keystroke_delay_bounds_by_character_class() {
        let mut rng = seeded(8);
        for _ in 0..500 {
            let plain = keystroke_delay(rng.as_mut(), 'a', 10).as_millis();
            assert!((80..150 + 700).contains(&plain));
            let newline = keystroke_delay(rng.as_mut(), '\n', 10).as_millis();
            assert!(newline >= 280);
        }

        let mut low = FixedSequence::repeat(0.999);
        assert_eq!(keystroke_delay(&mut low, 'x', 20), Duration::from_millis(149));
        assert_eq!(keystroke_delay(&mut low, '.', 20), Duration::from_millis(248));
        assert_eq!(keystroke_delay(&mut low, ' ', 0), Duration::from_millis(227));
        assert_eq!(keystroke_delay(&mut low, '\n', 20), Duration::from_millis(648));
    }

    #[test]
    fn reread_pause_applies_when_chance_fires() {
        let mut rng = FixedSequence::repeat(0.0);
        assert_eq!(keystroke_delay(&mut rng, 'a', 9), Duration::from_millis(280));
    }

    #[tokio::test]
    async fn types_in_order_without_mistakes() {
        let page = Arc::new(RecordingPage::new());
        let (_clock, pacer) = manual_pacer();
        let mut typing = controller(page.clone(), pacer, Box::new(FixedSequence::repeat(0.99)));

        typing.type_text(&field(), "Hi, Zoë!\nok").await.unwrap();

        let expected: Vec<String> = "Hi, Zoë!\nok".chars().map(String::from).collect();
        assert_eq!(page.inputs(), expected);
        assert_eq!(page.calls()[0], PageCall::Focus("message".into()));
    }

    #[tokio::test]
    async fn typos_are_corrected_and_never_on_last_char() {
        let page = Arc::new(RecordingPage::new());
        let (_clock, pacer) = manual_pacer();
        let mut typing = controller(page.clone(), pacer, Box::new(FixedSequence::repeat(0.0)));

        typing.type_text(&field(), "abc").await.unwrap();

        assert_eq!(page.inputs(), vec!["a", "a", "a", "b", "c"]);
        let backspaces = page
            .calls()
            .iter()
            .filter(|c| matches!(c, PageCall::PressKey(Key::Backspace)))
            .count();
        assert_eq!(backspaces, 2);
        assert_eq!(page.typed_text(), "abc");
    }

    #[tokio::test]
    async fn input_count_is_at_least_text_length() {
        let (_clock, pacer) = manual_pacer();
        let text = "The quick brown fox jumps over the lazy dog.";
        for seed in 0..20 {
            let page = Arc::new(RecordingPage::new());
            let mut typing = controller(page.clone(), pacer.clone(), seeded(seed));
            typing.type_text(&field(), text).await.unwrap();
            assert!(page.inputs().len() >= text.chars().count());
            assert_eq!(page.typed_text(), text);
        }
    }

    #[tokio::test]
    async fn initial_focus_delay_precedes_typing() {
        let page = Arc::new(RecordingPage::new());
        let (clock, pacer) = manual_pacer();
        let mut typing = controller(page.clone(), pacer, Box::new(FixedSequence::repeat(0.99)));

        typing.type_text(&field(), "x").await.unwrap();
        assert_eq!(clock.sleeps()[0], Duration::from_millis(993));
    }

    #[tokio::test]
    async fn bursts_retype_erased_tail() {
        let page = Arc::new(RecordingPage::new());
        let (_clock, pacer) = manual_pacer();
        // 0.01 fires the retype burst (< 0.15) and typos (< 0.05).
        let mut typing = controller(page.clone(), pacer, Box::new(FixedSequence::repeat(0.01)));

        typing
            .type_with_backspace_bursts(&field(), "hello  brave world")
            .await
            .unwrap();

        assert_eq!(page.typed_text(), "hello brave world");
        let spaces = page.inputs().iter().filter(|s| s.as_str() == " ").count();
        assert_eq!(spaces, 2);
    }

    #[tokio::test]
    async fn burst_erases_with_paced_backspaces_and_spaces_between_words() {
        let page = Arc::new(RecordingPage::new());
        let (clock, pacer) = manual_pacer();
        // 0.125: no typos, no reread pauses, the retype burst fires, below(3) = 0.
        let mut typing = controller(page.clone(), pacer, Box::new(FixedSequence::repeat(0.125)));

        typing
            .type_with_backspace_bursts(&field(), "hello to")
            .await
            .unwrap();

        let focus = || PageCall::Focus("message".into());
        let input = |s: &str| PageCall::InputText(s.into());
        assert_eq!(
            page.calls(),
            vec![
                focus(),
                input("h"),
                input("e"),
                input("l"),
                input("l"),
                input("o"),
                PageCall::PressKey(Key::Backspace),
                focus(),
                input("o"),
                input(" "),
                focus(),
                input("t"),
                input("o"),
            ]
        );

        let ms = |v: &[u64]| v.iter().map(|m| Duration::from_millis(*m)).collect::<Vec<_>>();
        // settle 387, keystrokes 94, erase gap 95, word gap 118.
        assert_eq!(
            clock.sleeps(),
            ms(&[387, 94, 94, 94, 94, 94, 95, 387, 94, 118, 387, 94, 94])
        );
        assert_eq!(page.typed_text(), "hello to");
    }

    #[tokio::test]
    async fn burst_can_erase_three_characters() {
        let page = Arc::new(RecordingPage::new());
        let (clock, pacer) = manual_pacer();
        // Sixteen draws type "abcd" cleanly, then the burst fires and
        // below(3) picks the largest erase.
        let mut values = vec![0.9375; 16];
        values.extend([0.0, 0.9375]);
        let mut typing = controller(page.clone(), pacer, Box::new(FixedSequence::new(values)));

        typing
            .type_with_backspace_bursts(&field(), "abcd")
            .await
            .unwrap();

        let calls = page.calls();
        let backspaces = calls
            .iter()
            .filter(|c| matches!(c, PageCall::PressKey(Key::Backspace)))
            .count();
        assert_eq!(backspaces, 3);
        assert_eq!(page.inputs().concat(), "abcdbcd");
        assert_ne!(calls.last(), Some(&PageCall::InputText(" ".into())));

        let ms = |v: &[u64]| v.iter().map(|m| Duration::from_millis(*m)).collect::<Vec<_>>();
        assert_eq!(
            clock.sleeps(),
            ms(&[956, 191, 191, 191, 191, 192, 192, 192, 956, 191, 191, 191])
        );
        assert_eq!(page.typed_text(), "abcd");
    }

    #[tokio::test]
    async fn short_words_are_never_retyped() {
        let page = Arc::new(RecordingPage::new());
        let (_clock, pacer) = manual_pacer();
        let mut typing = controller(page.clone(), pacer, Box::new(FixedSequence::repeat(0.06)));

        typing
            .type_with_backspace_bursts(&field(), "to be or not")
            .await
            .unwrap();

        assert_eq!(page.inputs().concat(), "to be or not");
        assert!(!page
            .calls()
            .iter()
            .any(|c| matches!(c, PageCall::PressKey(_))));
    }

    #[tokio::test]
    async fn fill_field_clears_then_types() {
        let page = Arc::new(RecordingPage::new());
        let (_clock, pacer) = manual_pacer();
        let mut typing = controller(page.clone(), pacer, Box::new(FixedSequence::repeat(0.99)));

        typing.fill_field(&field(), "new value").await.unwrap();

        let calls = page.calls();
        assert_eq!(calls[0], PageCall::SelectAll("message".into()));
        assert_eq!(calls[1], PageCall::PressKey(Key::Backspace));
        assert_eq!(calls[2], PageCall::Focus("message".into()));
        assert_eq!(page.typed_text(), "new value");
    }

    #[tokio::test]
    async fn failure_mid_text_keeps_earlier_keystrokes() {
        // focus, then three characters, then the fourth input fails.
        let page = Arc::new(RecordingPage::new().fail_at_call(4));
        let (_clock, pacer) = manual_pacer();
        let mut typing = controller(page.clone(), pacer, Box::new(FixedSequence::repeat(0.99)));

        let err = typing.type_text(&field(), "abcdef").await.unwrap_err();
        assert!(matches!(
            err,
            BehaviorError::Interaction {
                action: "input text",
                ..
            }
        ));
        assert_eq!(page.typed_text(), "abc");
    }
}
