use voice_bridge::{Notice, NoticeLevel, OutboundMessage};
use voicenav_cli::{parse_events, run_replay, Config, ReplayEvent, SiteFixture};

fn demo() -> (SiteFixture, Vec<ReplayEvent>) {
    let site = std::fs::read_to_string("demos/site.yaml").expect("site fixture");
    let events = std::fs::read_to_string("demos/session.jsonl").expect("session fixture");
    (
        SiteFixture::from_yaml(&site).unwrap(),
        parse_events(&events).unwrap(),
    )
}

fn results(messages: &[OutboundMessage]) -> Vec<(&str, &str, bool)> {
    messages
        .iter()
        .filter_map(|message| match message {
            OutboundMessage::DomActionResult {
                action_id,
                result,
                success,
            } => Some((action_id.as_str(), result.as_str(), *success)),
            OutboundMessage::PageContent { .. } => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn demo_session_replays_end_to_end() {
    let (site, events) = demo();
    let report = run_replay(&site, &events, &Config::default()).await;

    assert_eq!(report.history, vec!["/reports"]);
    assert_eq!(report.final_path, "/reports");

    let results = results(&report.messages);
    assert_eq!(results.len(), 2, "{results:?}");
    assert_eq!(results[0].0, "fill-1");
    assert!(results[0].2 && results[0].1.starts_with("Filled"), "{results:?}");
    assert_eq!(results[1], ("click-1", r#"Clicked "View Report""#, true));

    assert_eq!(report.notices[0], Notice::info("Opening Reports"));
    assert_eq!(report.notices.len(), 2);
    assert_eq!(report.notices[1].level, NoticeLevel::Warning);
}

#[tokio::test(start_paused = true)]
async fn content_is_reported_for_each_route() {
    let (site, events) = demo();
    let report = run_replay(&site, &events, &Config::default()).await;

    let paths: Vec<&str> = report
        .messages
        .iter()
        .filter_map(|message| match message {
            OutboundMessage::PageContent { content } => Some(content.pathname.as_str()),
            OutboundMessage::DomActionResult { .. } => None,
        })
        .collect();
    assert_eq!(paths.first(), Some(&"/dashboard"));
    assert!(paths.contains(&"/reports"));
}

#[tokio::test(start_paused = true)]
async fn nothing_is_published_without_a_connection() {
    let (site, _) = demo();
    let events = parse_events(
        r#"{"event":"data","participant":"voice-agent","payload":{"type":"agent-navigation-url","url":"/bots"}}"#,
    )
    .unwrap();
    let report = run_replay(&site, &events, &Config::default()).await;
    assert!(report.messages.is_empty());
    assert!(report.history.is_empty());
    assert_eq!(report.final_path, "/dashboard");
}
