#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;

use application::state_aware_marker::StateAwareMarker;
use domain::alert::fingerprint::Fingerprint;
use ports::secondary::alert_marker::{AlertMarker, GroupMarker};
use ports::secondary::state_appender::StateAppender;
use ports::test_utils::RecordingAppender;

const SILENCES: [&str; 3] = ["s1", "s2", "s3"];

fn pick(ids: &[String], mask: u8) -> Vec<String> {
    ids.iter()
        .enumerate()
        .filter(|(i, _)| mask & (1 << i) != 0)
        .map(|(_, id)| id.clone())
        .collect()
}

// Drive arbitrary operation sequences through the decorator and check that
// repeating a mutating call right away never appends another row.
//
// Layout, 3 bytes per operation:
//   [0] = selector (0=set_active_or_silenced, 1=set_inhibited, 2=delete, 3=set_muted)
//   [1] = alert index (4 alerts)
//   [2] = bitmask choosing silences or inhibitors
fuzz_target!(|data: &[u8]| {
    let appender = Arc::new(RecordingAppender::new());
    let marker = StateAwareMarker::in_memory(Arc::clone(&appender) as Arc<dyn StateAppender>);

    let alerts: Vec<Fingerprint> = (1..=4).map(Fingerprint).collect();
    let alert_ids: Vec<String> = alerts.iter().map(ToString::to_string).collect();
    let silence_ids: Vec<String> = SILENCES.iter().map(ToString::to_string).collect();

    for chunk in data.chunks_exact(3) {
        let alert = alerts[usize::from(chunk[1]) % alerts.len()];
        let mask = chunk[2];

        let apply = |marker: &StateAwareMarker| match chunk[0] % 4 {
            0 => marker.set_active_or_silenced(
                alert,
                u64::from(mask),
                &pick(&silence_ids, mask),
                &[],
            ),
            1 => marker.set_inhibited(alert, &pick(&alert_ids, mask)),
            2 => marker.delete(alert),
            _ => marker.set_muted("route", "group", &pick(&silence_ids, mask)),
        };

        apply(&marker);
        let before = appender.calls().len();
        apply(&marker);
        assert_eq!(
            appender.calls().len(),
            before,
            "repeated operation {} on {alert} appended a row",
            chunk[0] % 4
        );
    }

    let _ = marker.count(&[]);
    let _ = marker.muted("route", "group");
});
