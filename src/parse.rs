use crate::channel::ChannelType;
use crate::error::{BvhError, Result};
use crate::skeleton::{NodeKind, Skeleton};
use crate::types::*;
use regex::Regex;
use std::io;
use std::path::Path;
use std::sync::LazyLock;

static RE_JOINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(ROOT|JOINT)(?:\s+(.*))?$").expect("joint pattern is valid"));
static RE_OFFSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^OFFSET(?:\s+(.*))?$").expect("offset pattern is valid"));
static RE_CHANNELS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^CHANNELS\s+(\S+)\s*(.*)$").expect("channels pattern is valid"));
static RE_FRAMES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Frames:\s*(.*)$").expect("frames pattern is valid"));
static RE_FRAME_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Frame Time:\s*(.*)$").expect("frame time pattern is valid"));

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// A non-blank input line together with its 1-based position in the original text.
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    number: usize,
    raw: &'a str,
}

impl<'a> Line<'a> {
    fn trimmed(&self) -> &'a str {
        self.raw.trim()
    }

    fn malformed(&self, expected: &'static str) -> BvhError {
        BvhError::MalformedHeader {
            line: self.number,
            text: self.raw.to_string(),
            expected,
        }
    }

    fn number_error(&self, token: &str) -> BvhError {
        BvhError::MalformedNumber {
            line: self.number,
            text: self.raw.to_string(),
            token: token.to_string(),
        }
    }

    fn count_mismatch(&self, expected: usize, found: usize) -> BvhError {
        BvhError::ChannelCountMismatch {
            line: self.number,
            text: self.raw.to_string(),
            expected,
            found,
        }
    }

    fn parse_floats(&self, fields: &str) -> Result<Vec<f64>> {
        fields
            .split_whitespace()
            .map(|token| token.parse::<f64>().map_err(|_| self.number_error(token)))
            .collect()
    }
}

/// Cursor over the non-blank lines, shared by every level of the recursive descent so
/// that a sibling resumes exactly where the previous subtree stopped.
struct LineCursor<'a> {
    lines: Vec<Line<'a>>,
    position: usize,
    /// Number given to the virtual line just past the end of the input.
    end_line: usize,
}

impl<'a> LineCursor<'a> {
    /// "\r\n", "\r" and "\n" all end a line; lines holding only whitespace are dropped.
    fn new(text: &'a str) -> Self {
        let mut lines = Vec::new();
        let mut number = 0;
        let mut last_was_empty = false;
        for raw in text.split("\r\n").flat_map(|chunk| chunk.split(['\r', '\n'])) {
            number += 1;
            last_was_empty = raw.is_empty();
            if !raw.trim().is_empty() {
                lines.push(Line { number, raw });
            }
        }
        // a trailing line break does not start another line
        let end_line = if last_was_empty { number } else { number + 1 };
        LineCursor {
            lines,
            position: 0,
            end_line,
        }
    }

    fn peek(&self) -> Option<Line<'a>> {
        self.lines.get(self.position).copied()
    }

    fn next_line(&mut self) -> Option<Line<'a>> {
        let line = self.peek()?;
        self.position += 1;
        Some(line)
    }

    /// Next line, or a `MalformedHeader` pointing past the end of the input.
    fn expect_line(&mut self, expected: &'static str) -> Result<Line<'a>> {
        self.next_line().ok_or(BvhError::MalformedHeader {
            line: self.end_line,
            text: String::new(),
            expected,
        })
    }

    /// Next line, which must read exactly `token` once trimmed.
    fn expect_token(&mut self, token: &'static str) -> Result<Line<'a>> {
        let line = self.expect_line(token)?;
        if line.trimmed() != token {
            return Err(line.malformed(token));
        }
        Ok(line)
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// What the first line of a node block introduced.
enum NodeHeader {
    Root(Option<String>),
    Joint(Option<String>),
    EndSite,
}

fn parse_node_header(line: &Line, parent: Option<Index>) -> Result<NodeHeader> {
    let trimmed = line.trimmed();

    //// ROOT/JOINT followed by an optional name
    if let Some(captures) = RE_JOINT.captures(trimmed) {
        let name = captures
            .get(2)
            .map(|m| m.as_str().trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        return match (&captures[1], parent) {
            ("ROOT", None) => Ok(NodeHeader::Root(name)),
            ("JOINT", Some(_)) => Ok(NodeHeader::Joint(name)),
            (_, None) => Err(line.malformed("ROOT")),
            (_, Some(_)) => Err(line.malformed("JOINT, End Site or }")),
        };
    }

    if parent.is_some() && trimmed.to_lowercase().starts_with("end site") {
        return Ok(NodeHeader::EndSite);
    }

    Err(line.malformed(if parent.is_none() {
        "ROOT"
    } else {
        "JOINT, End Site or }"
    }))
}

fn parse_offset(line: &Line) -> Result<Position> {
    let captures = RE_OFFSET
        .captures(line.trimmed())
        .ok_or_else(|| line.malformed("OFFSET"))?;
    let values = line.parse_floats(captures.get(1).map_or("", |m| m.as_str()))?;
    if values.len() != 3 {
        return Err(line.malformed("OFFSET x y z"));
    }
    Ok(Position::new(values[0], values[1], values[2]))
}

fn parse_channels(line: &Line, node: Index, skeleton: &mut Skeleton) -> Result<()> {
    let captures = RE_CHANNELS
        .captures(line.trimmed())
        .ok_or_else(|| line.malformed("CHANNELS"))?;

    let declared = captures[1]
        .parse::<usize>()
        .map_err(|_| line.number_error(&captures[1]))?;
    let names: Vec<&str> = captures[2].split_whitespace().collect();
    if names.len() != declared {
        return Err(line.count_mismatch(declared, names.len()));
    }

    for name in names {
        let kind = name
            .parse::<ChannelType>()
            .map_err(|unknown| BvhError::UnknownChannelType {
                line: line.number,
                text: line.raw.to_string(),
                token: unknown.0,
            })?;
        skeleton
            .bind_channel(node, kind)
            .ok_or_else(|| line.malformed("a joint to bind channels to"))?;
    }
    Ok(())
}

/// Parse one ROOT, JOINT or End Site block, children included.
///
/// The node is created right after its OFFSET line so that its CHANNELS, and the
/// channels of everything below it, bind to a node that already exists.
fn parse_node(
    cursor: &mut LineCursor,
    skeleton: &mut Skeleton,
    parent: Option<Index>,
) -> Result<Index> {
    let header_line = cursor.expect_line(if parent.is_none() {
        "ROOT"
    } else {
        "JOINT, End Site or }"
    })?;
    let header = parse_node_header(&header_line, parent)?;

    cursor.expect_token("{")?;
    let offset_line = cursor.expect_line("OFFSET")?;
    let offset = parse_offset(&offset_line)?;

    //// Create node
    let (node, is_end_site) = match (header, parent) {
        (NodeHeader::Root(name), _) => (skeleton.add_root(name, offset), false),
        (NodeHeader::Joint(name), Some(parent)) => (
            skeleton
                .add_child(parent, NodeKind::Joint, name, offset)
                .ok_or_else(|| header_line.malformed("JOINT inside a joint block"))?,
            false,
        ),
        (NodeHeader::EndSite, Some(parent)) => (
            skeleton
                .add_child(parent, NodeKind::EndSite, None, offset)
                .ok_or_else(|| header_line.malformed("End Site inside a joint block"))?,
            true,
        ),
        (_, None) => return Err(header_line.malformed("ROOT")),
    };

    if is_end_site {
        cursor.expect_token("}")?;
        return Ok(node);
    }

    //// CHANNELS is optional
    if let Some(line) = cursor.peek() {
        if line.trimmed().starts_with("CHANNELS") {
            cursor.next_line();
            parse_channels(&line, node, skeleton)?;
        }
    }

    //// Children until the closing brace
    loop {
        let line = cursor
            .peek()
            .ok_or(BvhError::MalformedHeader {
                line: cursor.end_line,
                text: String::new(),
                expected: "}",
            })?;
        if line.trimmed() == "}" {
            cursor.next_line();
            return Ok(node);
        }
        parse_node(cursor, skeleton, Some(node))?;
    }
}

fn parse_motion(cursor: &mut LineCursor, skeleton: &mut Skeleton) -> Result<()> {
    cursor.expect_token("MOTION")?;

    //// Frames: <int>, informational only
    let line = cursor.expect_line("Frames:")?;
    let declared_frames = RE_FRAMES
        .captures(line.trimmed())
        .and_then(|captures| captures[1].trim().parse::<usize>().ok());
    if declared_frames.is_none() {
        log::warn!(
            "Line {}: no frame count in '{}', ignoring it",
            line.number,
            line.trimmed()
        );
    }
    skeleton.set_declared_frames(declared_frames);

    //// Frame Time: <float> (usually after a tab)
    let line = cursor.expect_line("Frame Time:")?;
    let captures = RE_FRAME_TIME
        .captures(line.trimmed())
        .ok_or_else(|| line.malformed("Frame Time:"))?;
    let frame_time = captures[1]
        .trim()
        .parse::<f64>()
        .map_err(|_| line.number_error(captures[1].trim()))?;
    skeleton.set_frame_time(frame_time);

    //// One row per frame, one value per channel in declaration order
    let expected = skeleton.channel_bindings().len();
    let mut rows = 0;
    while let Some(line) = cursor.next_line() {
        let values = line.parse_floats(line.raw)?;
        if !skeleton.push_frame(&values) {
            return Err(line.count_mismatch(expected, values.len()));
        }
        rows += 1;
    }

    if let Some(declared) = declared_frames.filter(|&declared| declared != rows) {
        log::warn!(
            "Frames: announces {} frames but {} rows of motion data were found",
            declared,
            rows
        );
    }
    Ok(())
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Parse the full text of a .bvh file.
///
/// One or more ROOT hierarchies are read, then the MOTION section. A leading
/// `HIERARCHY` line is skipped if present.
pub fn parse_bvh(text: &str) -> Result<Skeleton> {
    let mut cursor = LineCursor::new(text);
    let mut skeleton = Skeleton::new();

    if cursor
        .peek()
        .is_some_and(|line| line.trimmed().starts_with("HIERARCHY"))
    {
        cursor.next_line();
    }

    loop {
        parse_node(&mut cursor, &mut skeleton, None)?;
        match cursor.peek() {
            Some(line) if line.trimmed().starts_with("ROOT") => continue,
            _ => break,
        }
    }

    parse_motion(&mut cursor, &mut skeleton)?;

    log::debug!(
        "Parsed {} roots, {} nodes, {} channels, {} frames at {}s per frame",
        skeleton.roots().len(),
        skeleton.len(),
        skeleton.channel_bindings().len(),
        skeleton.frame_count(),
        skeleton.frame_time_seconds()
    );
    Ok(skeleton)
}

/// load a bvh file from a file path
pub fn load_bvh_from_file<P: AsRef<Path>>(path: P) -> Result<Skeleton> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => BvhError::NotFound {
            path: path.to_path_buf(),
        },
        _ => BvhError::Io(e),
    })?;
    log::debug!("Loading {}", path.display());
    parse_bvh(&contents)
}

/// load a bvh file from a string
pub fn load_bvh_from_string(bvh_string: &str) -> Result<Skeleton> {
    parse_bvh(bvh_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARM: &str = "HIERARCHY
ROOT Hips
{
\tOFFSET 0.00 0.00 0.00
\tCHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Yrotation
\tJOINT Shoulder
\t{
\t\tOFFSET 1.0 2.0 3.0
\t\tCHANNELS 3 Zrotation Xrotation Yrotation
\t\tEnd Site
\t\t{
\t\t\tOFFSET 0.0 -4.0 0.0
\t\t}
\t}
}
MOTION
Frames: 2
Frame Time:\t0.0333333
1 2 3 4 5 6 7 8 9
10 20 30 40 50 60 70 80 90
";

    #[test]
    fn test_line_cursor_numbers_and_separators() {
        let cursor = LineCursor::new("a\r\nb\rc\n  \n\nd");
        let seen: Vec<(usize, &str)> = cursor.lines.iter().map(|l| (l.number, l.raw)).collect();
        assert_eq!(seen, vec![(1, "a"), (2, "b"), (3, "c"), (6, "d")]);
        assert_eq!(cursor.end_line, 7);
    }

    #[test]
    fn test_parse_arm() {
        let skeleton = parse_bvh(ARM).unwrap();
        assert_eq!(skeleton.roots(), &[0]);
        assert_eq!(skeleton.len(), 3);

        let hips = skeleton.node(0).unwrap();
        assert_eq!(hips.name(), Some("Hips"));
        assert_eq!(hips.channels(), &[0, 1, 2, 3, 4, 5]);

        let shoulder = skeleton.find("Shoulder").unwrap();
        assert_eq!(shoulder.parent(), Some(0));
        assert_eq!(shoulder.offset(), Position::new(1.0, 2.0, 3.0));
        assert_eq!(shoulder.channels(), &[6, 7, 8]);

        let end = skeleton.node(2).unwrap();
        assert!(end.is_end_site());
        assert!(end.channels().is_empty());

        let kinds: Vec<ChannelType> = skeleton.channel_bindings().iter().map(|c| c.kind).collect();
        assert_eq!(kinds[3], ChannelType::Zrotation);
        assert_eq!(kinds[6], ChannelType::Zrotation);

        assert_eq!(skeleton.declared_frames(), Some(2));
        assert_eq!(skeleton.frame_count(), 2);
        assert_eq!(skeleton.channel_bindings()[8].samples, vec![9.0, 90.0]);
        assert!((skeleton.frame_time_seconds() - 0.0333333).abs() < 1e-12);
    }

    #[test]
    fn test_frame_time_after_spaces() {
        let text = ARM.replace("Frame Time:\t", "Frame Time: ");
        let skeleton = parse_bvh(&text).unwrap();
        assert_eq!(skeleton.fps(), 30);
    }

    #[test]
    fn test_unnamed_root() {
        let text = "ROOT\n{\nOFFSET 0 0 0\nCHANNELS 1 Xposition\n}\n\
                    MOTION\nFrames: 1\nFrame Time:\t0.1\n5\n";
        let skeleton = parse_bvh(text).unwrap();
        assert_eq!(skeleton.node(0).unwrap().name(), None);
        assert_eq!(skeleton.channel_bindings()[0].samples, vec![5.0]);
    }

    #[test]
    fn test_unknown_channel_token() {
        let text = ARM.replace(
            "Zrotation Xrotation Yrotation\n\t\tEnd",
            "Zrotation Xrot Yrotation\n\t\tEnd",
        );
        match parse_bvh(&text) {
            Err(BvhError::UnknownChannelType { line, token, .. }) => {
                assert_eq!(line, 9);
                assert_eq!(token, "Xrot");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_bad_offset_number() {
        let text = ARM.replace("OFFSET 1.0 2.0 3.0", "OFFSET 1.0 two 3.0");
        let error = parse_bvh(&text).unwrap_err();
        assert!(matches!(
            error,
            BvhError::MalformedNumber { line: 8, ref token, .. } if token == "two"
        ));
        assert_eq!(error.line_text(), Some("\t\tOFFSET 1.0 two 3.0"));
    }

    #[test]
    fn test_declared_channel_count_must_match() {
        let text = ARM.replace("CHANNELS 3 Zrotation", "CHANNELS 4 Zrotation");
        assert!(matches!(
            parse_bvh(&text),
            Err(BvhError::ChannelCountMismatch { expected: 4, found: 3, .. })
        ));
    }

    #[test]
    fn test_motion_keyword_required() {
        let text = ARM.replace("MOTION", "MOTIONS");
        let error = parse_bvh(&text).unwrap_err();
        assert!(matches!(error, BvhError::MalformedHeader { expected: "MOTION", line: 16, .. }));
    }

    #[test]
    fn test_missing_brace_after_joint() {
        let text = ARM.replace("JOINT Shoulder\n\t{", "JOINT Shoulder\n\tOFFSET 0 0 0");
        let error = parse_bvh(&text).unwrap_err();
        assert!(matches!(error, BvhError::MalformedHeader { expected: "{", line: 7, .. }));
    }

    #[test]
    fn test_nested_root_is_rejected() {
        let text = ARM.replace("JOINT Shoulder", "ROOT Shoulder");
        assert!(matches!(
            parse_bvh(&text),
            Err(BvhError::MalformedHeader { line: 6, .. })
        ));
    }

    #[test]
    fn test_unreadable_frame_count_is_ignored() {
        let text = ARM.replace("Frames: 2", "Frames: many");
        let skeleton = parse_bvh(&text).unwrap();
        assert_eq!(skeleton.declared_frames(), None);
        assert_eq!(skeleton.frame_count(), 2);

        let text = ARM.replace("Frames: 2", "Frames:");
        assert_eq!(parse_bvh(&text).unwrap().declared_frames(), None);
    }

    #[test]
    fn test_bad_frame_time() {
        let text = ARM.replace("Frame Time:\t0.0333333", "Frame Time:\tfast");
        assert!(matches!(
            parse_bvh(&text),
            Err(BvhError::MalformedNumber { line: 18, .. })
        ));
    }

    #[test]
    fn test_offset_needs_three_values() {
        let text = ARM.replace("OFFSET 1.0 2.0 3.0", "OFFSET 1.0 2.0");
        match parse_bvh(&text) {
            Err(BvhError::MalformedHeader { line, expected, .. }) => {
                assert_eq!(line, 8);
                assert_eq!(expected, "OFFSET x y z");
            }
            other => panic!("expected a malformed OFFSET line, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let error = load_bvh_from_file("./does/not/exist.bvh").unwrap_err();
        assert!(matches!(error, BvhError::NotFound { .. }));
        assert_eq!(error.line(), None);
    }
}
