use std::collections::BTreeSet;

use channel_data::ChannelLine;

/// Pick the line index to play for a channel.
///
/// A requested index wraps around the line count in both directions, so
/// `current + 1` and `current - 1` can be passed without bounds checks.
/// Without a request, the first line whose URL is known to play wins, then
/// the first line whose host is known to play, then line 0.
///
/// The result is always a valid index, or 0 for an empty line list.
pub fn select_line_idx(
    lines: &[ChannelLine],
    requested: Option<i64>,
    playable_urls: &BTreeSet<String>,
    playable_hosts: &BTreeSet<String>,
) -> usize {
    if lines.is_empty() {
        return 0;
    }
    let last = lines.len() - 1;

    let idx = match requested {
        Some(requested) => requested.rem_euclid(lines.len() as i64) as usize,
        None => lines
            .iter()
            .position(|line| playable_urls.contains(&line.url))
            .or_else(|| {
                lines
                    .iter()
                    .position(|line| {
                        let host = line.host();
                        !host.is_empty() && playable_hosts.contains(&host)
                    })
            })
            .unwrap_or(0),
    };

    idx.min(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines() -> Vec<ChannelLine> {
        vec![
            ChannelLine::new("http://a.example.com/live/1.m3u8"),
            ChannelLine::new("http://b.example.com/live/1.m3u8"),
            ChannelLine::new("http://c.example.com/live/1.m3u8"),
        ]
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_requested_index_wraps() {
        let lines = lines();
        let empty = BTreeSet::new();
        assert_eq!(select_line_idx(&lines, Some(-1), &empty, &empty), 2);
        assert_eq!(select_line_idx(&lines, Some(4), &empty, &empty), 1);
        assert_eq!(select_line_idx(&lines, Some(3), &empty, &empty), 0);
        assert_eq!(select_line_idx(&lines, Some(-4), &empty, &empty), 2);
        for r in -10..10 {
            assert_eq!(
                select_line_idx(&lines, Some(r), &empty, &empty),
                ((r % 3 + 3) % 3) as usize
            );
        }
    }

    #[test]
    fn test_requested_index_beats_playable_sets() {
        let lines = lines();
        let urls = set(&["http://c.example.com/live/1.m3u8"]);
        assert_eq!(select_line_idx(&lines, Some(0), &urls, &BTreeSet::new()), 0);
    }

    #[test]
    fn test_prefers_known_playable_url() {
        let lines = lines();
        let urls = set(&["http://c.example.com/live/1.m3u8"]);
        let hosts = set(&["a.example.com"]);
        assert_eq!(select_line_idx(&lines, None, &urls, &hosts), 2);
    }

    #[test]
    fn test_falls_back_to_known_host() {
        let lines = lines();
        let urls = set(&["http://other.example.com/x.m3u8"]);
        let hosts = set(&["b.example.com"]);
        assert_eq!(select_line_idx(&lines, None, &urls, &hosts), 1);
    }

    #[test]
    fn test_unparsable_lines_share_no_host() {
        let lines = vec![
            ChannelLine::new("not a url"),
            ChannelLine::new("also/not/a/url"),
        ];
        let hosts = set(&[""]);
        assert_eq!(select_line_idx(&lines, None, &BTreeSet::new(), &hosts), 0);

        let lines = vec![
            ChannelLine::new("garbage"),
            ChannelLine::new("http://b.example.com/live/1.m3u8"),
        ];
        let hosts = set(&["", "b.example.com"]);
        assert_eq!(select_line_idx(&lines, None, &BTreeSet::new(), &hosts), 1);
    }

    #[test]
    fn test_defaults_to_first_line() {
        let lines = lines();
        assert_eq!(
            select_line_idx(&lines, None, &BTreeSet::new(), &BTreeSet::new()),
            0
        );
        assert_eq!(
            select_line_idx(&[], Some(5), &BTreeSet::new(), &BTreeSet::new()),
            0
        );
    }
}
