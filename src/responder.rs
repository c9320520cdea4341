//! Bot replies.
//!
//! [`Responder`] is where a real inference backend would plug in. The only
//! implementation today is [`MockResponder`], which waits a fixed delay and
//! answers with one of a handful of canned templates.

use crate::types::truncate_chars;
use async_trait::async_trait;
use rand::Rng;
use rand::seq::SliceRandom;
use std::time::Duration;

#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, message: &str) -> String;
}

#[derive(Clone, Copy, Debug)]
enum Template {
    Plain(&'static str),
    /// `{}` is replaced by the first `n` chars of the user's message.
    Echo(&'static str, usize),
}

const TEMPLATES: &[Template] = &[
    Template::Echo("You asked about \"{}\". Here's a quick take: it depends on the details, but let's dig in.", 30),
    Template::Echo("Thanks for your message! Regarding \"{}\", I'd suggest starting with the basics.", 20),
    Template::Plain("That's a great question. I'm a demo assistant, so my answers are canned for now."),
    Template::Echo("Interesting point about \"{}\". Could you tell me a bit more?", 25),
    Template::Plain("I hear you. In a real deployment this is where a model would respond."),
];

/// Picks a template uniformly at random and fills it from `message`.
pub fn compose_reply<R: Rng + ?Sized>(message: &str, rng: &mut R) -> String {
    let template = TEMPLATES
        .choose(rng)
        .copied()
        .unwrap_or(Template::Plain("..."));
    render(template, message)
}

fn render(template: Template, message: &str) -> String {
    match template {
        Template::Plain(text) => text.to_string(),
        Template::Echo(text, prefix_chars) => {
            text.replacen("{}", &truncate_chars(message.trim(), prefix_chars), 1)
        }
    }
}

#[derive(Clone, Debug)]
pub struct MockResponder {
    delay: Duration,
}

impl MockResponder {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for MockResponder {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_REPLY_DELAY)
    }
}

#[async_trait]
impl Responder for MockResponder {
    async fn respond(&self, message: &str) -> String {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        compose_reply(message, &mut rand::thread_rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn all_renderings(message: &str) -> Vec<String> {
        TEMPLATES.iter().map(|t| render(*t, message)).collect()
    }

    #[test]
    fn test_reply_is_one_of_the_templates() {
        let mut rng = StdRng::seed_from_u64(7);
        let candidates = all_renderings("How do I bake bread?");
        for _ in 0..50 {
            let reply = compose_reply("How do I bake bread?", &mut rng);
            assert!(candidates.contains(&reply), "unexpected reply: {reply}");
        }
    }

    #[test]
    fn test_every_template_is_reachable() {
        let mut rng = StdRng::seed_from_u64(42);
        let candidates = all_renderings("hi");
        let mut seen = vec![false; candidates.len()];
        for _ in 0..500 {
            let reply = compose_reply("hi", &mut rng);
            if let Some(idx) = candidates.iter().position(|c| c == &reply) {
                seen[idx] = true;
            }
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_echo_uses_message_prefix() {
        let long = "abcdefghijklmnopqrstuvwxyz0123456789";
        let reply = render(Template::Echo("[{}]", 20), long);
        assert_eq!(reply, "[abcdefghijklmnopqrst...]");

        let short = render(Template::Echo("[{}]", 20), "  short  ");
        assert_eq!(short, "[short]");
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_responder_waits_for_delay() {
        let responder = MockResponder::new(Duration::from_millis(1500));
        let started = tokio::time::Instant::now();
        let reply = responder.respond("Hello").await;
        assert!(started.elapsed() >= Duration::from_millis(1500));
        assert!(all_renderings("Hello").contains(&reply));
    }
}
