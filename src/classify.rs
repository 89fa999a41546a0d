use std::collections::BTreeSet;

use crate::models::{AppAccessProfile, Permission, Reason, RiskTag, ScoredRecord};
use crate::patterns::{
    self, EMAIL_LINK, EMAIL_SPAM_KEYWORDS, EMAIL_URGENCY, REPEATED_PUNCTUATION, SMS_LINK,
    SMS_SPAM_KEYWORDS, SMS_URGENCY, SUSPICIOUS_EMAIL_DOMAINS, SUSPICIOUS_SENDER_TOKENS,
};

const MAX_SCORE: u32 = 100;
const SHORT_MESSAGE_CHARS: usize = 20;
const ALL_CAPS_MIN_CHARS: usize = 10;

#[derive(Debug, Default)]
struct Tally {
    score: u32,
    reasons: BTreeSet<Reason>,
}

impl Tally {
    fn add(&mut self, points: u32, reason: Reason) {
        self.score += points;
        self.reasons.insert(reason);
    }

    fn finish(self) -> ScoredRecord {
        ScoredRecord {
            score: self.score.min(MAX_SCORE) as u8,
            reasons: self.reasons.into_iter().collect(),
        }
    }
}

pub fn classify_message(sender: &str, body: &str) -> ScoredRecord {
    let mut tally = Tally::default();
    let lower_body = body.to_lowercase();

    for _ in 0..patterns::count_keywords(&lower_body, SMS_SPAM_KEYWORDS) {
        tally.add(10, Reason::SpamKeywords);
    }

    if patterns::contains_any(sender, SUSPICIOUS_SENDER_TOKENS) {
        tally.add(15, Reason::SuspiciousSenderNumber);
    }

    if SMS_LINK.is_match(body) {
        tally.add(10, Reason::Links);
    }

    if SMS_URGENCY.is_match(body) {
        tally.add(5, Reason::Urgency);
    }

    if body.chars().count() < SHORT_MESSAGE_CHARS && tally.score > 0 {
        tally.add(5, Reason::ShortMessage);
    }

    tally.finish()
}

pub fn classify_email(sender: &str, subject: &str, preview: &str) -> ScoredRecord {
    let mut tally = Tally::default();
    let lower_subject = subject.to_lowercase();
    let lower_preview = preview.to_lowercase();
    let lower_sender = sender.to_lowercase();

    for _ in 0..patterns::count_keywords(&lower_subject, EMAIL_SPAM_KEYWORDS) {
        tally.add(15, Reason::SpamKeywords);
    }

    for _ in 0..patterns::count_keywords(&lower_preview, EMAIL_SPAM_KEYWORDS) {
        tally.add(10, Reason::SuspiciousContent);
    }

    if patterns::contains_any(&lower_sender, SUSPICIOUS_EMAIL_DOMAINS) {
        tally.add(20, Reason::SuspiciousSenderDomain);
    }

    if EMAIL_LINK.is_match(subject) || EMAIL_LINK.is_match(preview) {
        tally.add(15, Reason::SuspiciousLinks);
    }

    if EMAIL_URGENCY.is_match(subject) {
        tally.add(10, Reason::Urgency);
    }

    if subject.chars().count() > ALL_CAPS_MIN_CHARS && subject == subject.to_uppercase() {
        tally.add(10, Reason::AllCapsSubject);
    }

    if REPEATED_PUNCTUATION.is_match(subject) {
        tally.add(8, Reason::ExcessivePunctuation);
    }

    tally.finish()
}

pub fn permissions_for(risk_tag: RiskTag) -> BTreeSet<Permission> {
    let granted: &[Permission] = match risk_tag {
        RiskTag::Low => &[Permission::Network],
        RiskTag::Medium => &[Permission::Network, Permission::Location, Permission::Camera],
        RiskTag::High => &[
            Permission::Network,
            Permission::Sms,
            Permission::Location,
            Permission::Camera,
        ],
    };
    granted.iter().copied().collect()
}

pub fn classify_app_risk(label: &str, risk_tag: RiskTag) -> AppAccessProfile {
    AppAccessProfile {
        app_label: label.to_string(),
        risk_tag,
        permissions: permissions_for(risk_tag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn has(result: &ScoredRecord, reason: Reason) -> bool {
        result.reasons.contains(&reason)
    }

    #[test]
    fn keyword_reason_appears_once_for_many_matches() {
        let result = classify_message("Alice", "free prize in the lottery, winner");
        let keyword_reasons = result
            .reasons
            .iter()
            .filter(|reason| **reason == Reason::SpamKeywords)
            .count();
        assert_eq!(keyword_reasons, 1);
        assert_eq!(result.score, 40);
    }

    #[test]
    fn empty_message_scores_zero() {
        let result = classify_message("", "");
        assert_eq!(result.score, 0);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn benign_message_scores_zero() {
        let result = classify_message("Mom", "See you at dinner tonight, love you");
        assert_eq!(result.score, 0);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn lottery_sms_is_flagged_on_every_axis() {
        let result = classify_message(
            "UNKNOWN",
            "Congratulations! You have won $1000. Click here to claim: bit.ly/fake",
        );
        assert!(has(&result, Reason::SpamKeywords));
        assert!(has(&result, Reason::SuspiciousSenderNumber));
        assert!(has(&result, Reason::Links));
        assert!(!has(&result, Reason::ShortMessage));
        // three keywords, sender, link
        assert_eq!(result.score, 55);
        assert_eq!(
            result.reasons,
            vec![Reason::SpamKeywords, Reason::SuspiciousSenderNumber, Reason::Links]
        );
    }

    #[test]
    fn sender_reason_is_deduplicated_across_tokens() {
        let result = classify_message("+44 UNKNOWN BLOCKED", "hello");
        assert_eq!(result.score, 20);
        assert_eq!(
            result.reasons,
            vec![Reason::SuspiciousSenderNumber, Reason::ShortMessage]
        );
    }

    #[test]
    fn sender_tokens_are_case_sensitive() {
        let result = classify_message("unknown", "hello");
        assert_eq!(result.score, 0);
    }

    #[test]
    fn short_message_bonus_needs_a_prior_hit() {
        let result = classify_message("Bob", "hurry up");
        assert_eq!(result.score, 10);
        assert_eq!(result.reasons, vec![Reason::Urgency, Reason::ShortMessage]);

        let quiet = classify_message("Bob", "ok");
        assert_eq!(quiet.score, 0);
    }

    #[test]
    fn short_message_counts_characters() {
        // 18 characters, 30 bytes
        let result = classify_message("Bob", "hurry éééééééééééé");
        assert!(has(&result, Reason::ShortMessage));
    }

    #[test]
    fn message_score_is_clamped() {
        let body = SMS_SPAM_KEYWORDS.join(" ");
        let result = classify_message("BLOCKED", &format!("{body} http://x"));
        assert_eq!(result.score, 100);
    }

    #[test]
    fn shouting_lottery_email_passes_threshold() {
        let result = classify_email(
            "winner@lottery.com",
            "CONGRATULATIONS!!! YOU WON $1,000,000!!!",
            "Click here to claim your prize now! Limited time offer!",
        );
        assert!(has(&result, Reason::AllCapsSubject));
        assert!(has(&result, Reason::ExcessivePunctuation));
        assert!(has(&result, Reason::SpamKeywords));
        assert!(has(&result, Reason::SuspiciousContent));
        assert_eq!(result.score, 63);
        assert!(result.score > 40);
    }

    #[test]
    fn subject_checks_fire_without_preview() {
        let result = classify_email("a@b.com", "CONGRATULATIONS!!! YOU WON $1,000,000!!!", "");
        assert_eq!(result.score, 33);
        assert_eq!(
            result.reasons,
            vec![
                Reason::SpamKeywords,
                Reason::AllCapsSubject,
                Reason::ExcessivePunctuation
            ]
        );
    }

    #[test]
    fn suspicious_domain_and_links() {
        let result = classify_email("Promo@Mail.RU", "hello", "see https://example.com");
        assert_eq!(result.score, 35);
        assert_eq!(
            result.reasons,
            vec![Reason::SuspiciousSenderDomain, Reason::SuspiciousLinks]
        );
    }

    #[test]
    fn email_urgency_only_reads_subject() {
        let result = classify_email("a@b.com", "hello friend", "reply now please");
        assert!(!has(&result, Reason::Urgency));

        let urgent = classify_email("a@b.com", "Please verify", "");
        assert_eq!(urgent.reasons, vec![Reason::Urgency]);
        assert_eq!(urgent.score, 10);
    }

    #[test]
    fn short_caps_subject_is_not_flagged() {
        let result = classify_email("a@b.com", "HELLO", "");
        assert!(!has(&result, Reason::AllCapsSubject));
    }

    #[test]
    fn app_risk_profiles_are_fixed() {
        let expectations = [
            (RiskTag::Low, [true, false, false, false]),
            (RiskTag::Medium, [true, false, true, true]),
            (RiskTag::High, [true, true, true, true]),
        ];
        for (tag, [network, sms, location, camera]) in expectations {
            for _ in 0..3 {
                let profile = classify_app_risk("X", tag);
                assert_eq!(profile.app_label, "X");
                assert_eq!(profile.risk_tag, tag);
                assert_eq!(profile.has(Permission::Network), network);
                assert_eq!(profile.has(Permission::Sms), sms);
                assert_eq!(profile.has(Permission::Location), location);
                assert_eq!(profile.has(Permission::Camera), camera);
            }
        }
    }

    proptest! {
        #[test]
        fn message_score_stays_in_range(sender in ".{0,40}", body in ".{0,200}") {
            let result = classify_message(&sender, &body);
            prop_assert!(result.score <= 100);
            let mut deduped = result.reasons.clone();
            deduped.dedup();
            prop_assert_eq!(deduped, result.reasons);
        }

        #[test]
        fn email_score_stays_in_range(
            sender in ".{0,40}",
            subject in ".{0,80}",
            preview in ".{0,200}",
        ) {
            prop_assert!(classify_email(&sender, &subject, &preview).score <= 100);
        }
    }
}
