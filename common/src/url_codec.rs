//! Bidirectional mapping between navigation URLs and [`FilterState`].
//!
//! Path grammar (groups in any order):
//!
//! ```text
//! /YYYY[/MM[/DD]]            date, nested in this order
//! /camera/<make>/<model>     camera pair
//! /lens/<model>              may repeat
//! /color/<name>              may repeat
//! ```
//!
//! Query keys: `year`, `month`, `day`, `camera_make` + `camera_model`,
//! `lens`, `color`, `time_of_day`, `season`, `focal_category`,
//! `shooting_condition` (repeatable or comma-joined), `in_burst`, `page`,
//! `limit`.
//!
//! The canonical form puts the contiguous year/month/day prefix and the
//! camera in the path and every other selection in the query string, in
//! descriptor order with values sorted. Pagination never appears in the
//! canonical URL; [`page_url`] adds it for prev/next links.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::dimension::{Cardinality, DIMENSIONS, Dimension};
use crate::filter_state::{CameraSelection, FilterState};
use crate::search_const::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Everything outside the RFC 3986 unreserved set is escaped, including `,`
/// so comma-joined query values stay unambiguous.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed path: {0}")]
    MalformedPath(String),
    #[error("malformed query string: {0}")]
    MalformedQuery(String),
}

fn path_err(msg: impl Into<String>) -> DecodeError {
    DecodeError::MalformedPath(msg.into())
}

fn query_err(msg: impl Into<String>) -> DecodeError {
    DecodeError::MalformedQuery(msg.into())
}

/// Decodes a request path and raw query string (with or without the
/// leading `?`). Never guesses: anything it does not understand is an error.
pub fn decode(path: &str, query: &str) -> Result<FilterState, DecodeError> {
    let mut parts = DecodedParts::default();
    parse_path(path, &mut parts)?;
    parse_query(query.strip_prefix('?').unwrap_or(query), &mut parts)?;
    parts.into_state()
}

#[derive(Default)]
struct DecodedParts {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    camera: Option<CameraSelection>,
    query_camera_make: Option<String>,
    query_camera_model: Option<String>,
    texts: Vec<(Dimension, String)>,
    in_burst: Option<bool>,
    page: Option<u64>,
    limit: Option<u64>,
}

impl DecodedParts {
    fn into_state(self) -> Result<FilterState, DecodeError> {
        let mut camera = self.camera;
        match (self.query_camera_make, self.query_camera_model) {
            (Some(make), Some(model)) => {
                let from_query = CameraSelection::new(make, model);
                if camera.as_ref().is_some_and(|c| c != &from_query) {
                    return Err(query_err("camera_make/camera_model conflict with the camera path"));
                }
                camera = Some(from_query);
            }
            (None, None) => {}
            _ => return Err(query_err("camera_make and camera_model must be given together")),
        }

        let mut state = FilterState::new();
        if let Some(year) = self.year {
            state = state.with_year(year);
        }
        if let Some(month) = self.month {
            state = state.with_month(month);
        }
        if let Some(day) = self.day {
            state = state.with_day(day);
        }
        if let Some(camera) = camera {
            state = state.with_camera(camera.make, camera.model);
        }
        for (dimension, value) in self.texts {
            state = state.with_value(dimension, &value.into());
        }
        if let Some(in_burst) = self.in_burst {
            state = state.with_in_burst(in_burst);
        }
        if let Some(limit) = self.limit {
            state = state.with_limit(limit);
        }
        if let Some(page) = self.page {
            let offset = (page - 1)
                .checked_mul(state.limit())
                .ok_or_else(|| query_err(format!("page {page} is out of range")))?;
            state = state.with_offset(offset);
        }
        Ok(state)
    }
}

fn parse_path(path: &str, parts: &mut DecodedParts) -> Result<(), DecodeError> {
    let segments = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            percent_decode_str(s)
                .decode_utf8()
                .map(|s| s.into_owned())
                .map_err(|_| path_err(format!("segment {s:?} is not valid UTF-8")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut date_seen = false;
    let mut i = 0;
    while i < segments.len() {
        let segment = segments[i].as_str();
        match segment {
            "camera" => {
                let make = segments.get(i + 1).ok_or_else(|| path_err("camera segment is missing its make"))?;
                let model = segments
                    .get(i + 2)
                    .ok_or_else(|| path_err(format!("camera {make:?} is missing its model sub-segment")))?;
                if parts.camera.is_some() {
                    return Err(path_err("camera may appear only once"));
                }
                parts.camera = Some(CameraSelection::new(make.clone(), model.clone()));
                i += 3;
            }
            "lens" | "color" => {
                let value = segments
                    .get(i + 1)
                    .ok_or_else(|| path_err(format!("{segment} segment is missing its value")))?;
                let dimension = if segment == "lens" { Dimension::Lens } else { Dimension::Colour };
                parts.texts.push((dimension, value.clone()));
                i += 2;
            }
            s if s.starts_with(|c: char| c.is_ascii_digit()) => {
                if date_seen {
                    return Err(path_err(format!("unexpected date segment {s:?}")));
                }
                date_seen = true;
                parts.year = Some(parse_year(s).map_err(path_err)?);
                i += 1;
                if let Some(next) = segments.get(i).filter(|s| is_numeric(s)) {
                    parts.month = Some(parse_month(next).map_err(path_err)?);
                    i += 1;
                    if let Some(next) = segments.get(i).filter(|s| is_numeric(s)) {
                        parts.day = Some(parse_day(next).map_err(path_err)?);
                        i += 1;
                    }
                }
            }
            other => return Err(path_err(format!("unrecognized segment {other:?}"))),
        }
    }
    Ok(())
}

fn parse_query(query: &str, parts: &mut DecodedParts) -> Result<(), DecodeError> {
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_query_component(raw_key)?;
        let key = key.as_str();

        if let Some(dimension) = multi_select_for_param(key) {
            for raw_part in raw_value.split(',') {
                let value = decode_query_component(raw_part)?;
                if value.is_empty() {
                    return Err(query_err(format!("empty value for {key}")));
                }
                parts.texts.push((dimension, value));
            }
            continue;
        }

        let value = decode_query_component(raw_value)?;
        match key {
            "year" => merge(&mut parts.year, parse_year(&value).map_err(query_err)?, key)?,
            "month" => merge(&mut parts.month, parse_month(&value).map_err(query_err)?, key)?,
            "day" => merge(&mut parts.day, parse_day(&value).map_err(query_err)?, key)?,
            "camera_make" => merge(&mut parts.query_camera_make, non_empty(value, key)?, key)?,
            "camera_model" => merge(&mut parts.query_camera_model, non_empty(value, key)?, key)?,
            "in_burst" => {
                let flag = match value.as_str() {
                    "true" | "1" => true,
                    "false" | "0" => false,
                    other => return Err(query_err(format!("in_burst must be true or false, got {other:?}"))),
                };
                merge(&mut parts.in_burst, flag, key)?;
            }
            "page" => {
                let page = parse_number::<u64>(&value, key).map_err(query_err)?;
                if page == 0 {
                    return Err(query_err("page numbers start at 1"));
                }
                merge(&mut parts.page, page, key)?;
            }
            "limit" => {
                let limit = parse_number::<u64>(&value, key).map_err(query_err)?;
                if !(1..=MAX_PAGE_SIZE).contains(&limit) {
                    return Err(query_err(format!("limit must be between 1 and {MAX_PAGE_SIZE}")));
                }
                merge(&mut parts.limit, limit, key)?;
            }
            other => return Err(query_err(format!("unknown parameter {other:?}"))),
        }
    }
    Ok(())
}

fn multi_select_for_param(key: &str) -> Option<Dimension> {
    DIMENSIONS
        .iter()
        .find(|d| d.cardinality == Cardinality::MultiSelect && d.query_param == key)
        .map(|d| d.dimension)
}

fn merge<T: PartialEq>(slot: &mut Option<T>, value: T, key: &str) -> Result<(), DecodeError> {
    match slot {
        Some(existing) if *existing != value => Err(query_err(format!("conflicting values for {key}"))),
        _ => {
            *slot = Some(value);
            Ok(())
        }
    }
}

fn non_empty(value: String, key: &str) -> Result<String, DecodeError> {
    if value.is_empty() {
        return Err(query_err(format!("empty value for {key}")));
    }
    Ok(value)
}

fn decode_query_component(raw: &str) -> Result<String, DecodeError> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| query_err(format!("{raw:?} is not valid UTF-8")))
}

fn is_numeric(segment: &&String) -> bool {
    segment.starts_with(|c: char| c.is_ascii_digit())
}

fn parse_number<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, String> {
    raw.parse::<T>().map_err(|_| format!("{what} {raw:?} is not an integer"))
}

fn parse_year(raw: &str) -> Result<i32, String> {
    let year = parse_number::<i32>(raw, "year")?;
    if !(1..=9999).contains(&year) {
        return Err(format!("year {year} is out of range"));
    }
    Ok(year)
}

fn parse_month(raw: &str) -> Result<u32, String> {
    let month = parse_number::<u32>(raw, "month")?;
    if !(1..=12).contains(&month) {
        return Err(format!("month {month} is out of range"));
    }
    Ok(month)
}

fn parse_day(raw: &str) -> Result<u32, String> {
    let day = parse_number::<u32>(raw, "day")?;
    if !(1..=31).contains(&day) {
        return Err(format!("day {day} is out of range"));
    }
    Ok(day)
}

fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

/// Canonical identity URL of `state`, pagination excluded.
pub fn canonical_url(state: &FilterState) -> String {
    let (path, params) = canonical_parts(state);
    join_url(path, &params)
}

/// Canonical URL plus `page` / `limit` when they differ from the defaults.
pub fn page_url(state: &FilterState, page: u64) -> String {
    let (path, mut params) = canonical_parts(state);
    if page > 1 {
        params.push(("page", page.to_string()));
    }
    if state.limit() != DEFAULT_PAGE_SIZE {
        params.push(("limit", state.limit().to_string()));
    }
    join_url(path, &params)
}

fn canonical_parts(state: &FilterState) -> (String, Vec<(&'static str, String)>) {
    let mut path = String::new();
    let mut params: Vec<(&'static str, String)> = Vec::new();

    match (state.year(), state.month(), state.day()) {
        (Some(year), month, day) => {
            path.push_str(&format!("/{year}"));
            match (month, day) {
                (Some(month), Some(day)) => path.push_str(&format!("/{month:02}/{day:02}")),
                (Some(month), None) => path.push_str(&format!("/{month:02}")),
                (None, Some(day)) => params.push(("day", day.to_string())),
                (None, None) => {}
            }
        }
        (None, month, day) => {
            if let Some(month) = month {
                params.push(("month", month.to_string()));
            }
            if let Some(day) = day {
                params.push(("day", day.to_string()));
            }
        }
    }

    if let Some(camera) = state.camera() {
        path.push_str(&format!("/camera/{}/{}", encode_component(&camera.make), encode_component(&camera.model)));
    }

    for descriptor in DIMENSIONS.iter() {
        match descriptor.cardinality {
            Cardinality::MultiSelect => {
                if let Some(values) = state.text_values(descriptor.dimension) {
                    params.extend(values.iter().map(|v| (descriptor.query_param, v.clone())));
                }
            }
            Cardinality::TriState => {
                if let Some(flag) = state.in_burst() {
                    params.push((descriptor.query_param, flag.to_string()));
                }
            }
            Cardinality::Hierarchical | Cardinality::CompositeScalar => {}
        }
    }

    if path.is_empty() {
        path.push('/');
    }
    (path, params)
}

fn join_url(path: String, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return path;
    }
    let query = params
        .iter()
        .map(|(key, value)| format!("{key}={}", encode_component(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{path}?{query}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_path_is_the_initial_state() {
        assert_eq!(decode("/", ""), Ok(FilterState::new()));
        assert_eq!(decode("", ""), Ok(FilterState::new()));
        assert_eq!(canonical_url(&FilterState::new()), "/");
    }

    #[test]
    fn decodes_date_paths() {
        let state = decode("/2024/03/15", "").unwrap();
        assert_eq!((state.year(), state.month(), state.day()), (Some(2024), Some(3), Some(15)));
        let state = decode("/2024/3", "").unwrap();
        assert_eq!((state.year(), state.month(), state.day()), (Some(2024), Some(3), None));
        assert_eq!(canonical_url(&state), "/2024/03");
    }

    #[test]
    fn decodes_camera_with_escaped_model() {
        let state = decode("/camera/Canon/EOS%20R5", "").unwrap();
        assert_eq!(state.camera(), Some(&CameraSelection::new("Canon", "EOS R5")));
        assert_eq!(canonical_url(&state), "/camera/Canon/EOS%20R5");
    }

    #[test]
    fn path_groups_are_order_insensitive() {
        let a = decode("/color/red/2024/camera/Canon/R5", "").unwrap();
        let b = decode("/2024/camera/Canon/R5/color/red", "").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn color_path_and_query_are_the_same_selection() {
        let from_path = decode("/color/purple", "").unwrap();
        let from_query = decode("/", "color=purple").unwrap();
        assert_eq!(from_path, from_query);
        assert_eq!(canonical_url(&from_path), "/?color=purple");
    }

    #[test]
    fn multi_select_accepts_repeated_and_comma_joined() {
        let repeated = decode("/", "season=summer&season=winter").unwrap();
        let joined = decode("/", "season=winter,summer").unwrap();
        assert_eq!(repeated, joined);
        assert_eq!(canonical_url(&joined), "/?season=summer&season=winter");
    }

    #[test]
    fn camera_without_model_is_malformed() {
        assert!(matches!(decode("/camera/Canon", ""), Err(DecodeError::MalformedPath(_))));
    }

    #[test]
    fn invalid_segment_ordering_is_malformed() {
        assert!(matches!(decode("/color/red/year/9999", ""), Err(DecodeError::MalformedPath(_))));
    }

    #[test]
    fn bad_numbers_are_malformed() {
        assert!(matches!(decode("/20x4", ""), Err(DecodeError::MalformedPath(_))));
        assert!(matches!(decode("/2024/13", ""), Err(DecodeError::MalformedPath(_))));
        assert!(matches!(decode("/2024/2023", ""), Err(DecodeError::MalformedPath(_))));
        assert!(matches!(decode("/2024/01/01/05", ""), Err(DecodeError::MalformedPath(_))));
        assert!(matches!(decode("/", "page=zero"), Err(DecodeError::MalformedQuery(_))));
        assert!(matches!(decode("/", "page=0"), Err(DecodeError::MalformedQuery(_))));
    }

    #[test]
    fn unknown_query_keys_and_conflicts_are_malformed() {
        assert!(matches!(decode("/", "sort=iso"), Err(DecodeError::MalformedQuery(_))));
        assert!(matches!(decode("/2024", "year=2023"), Err(DecodeError::MalformedQuery(_))));
        assert!(matches!(decode("/", "in_burst=maybe"), Err(DecodeError::MalformedQuery(_))));
        assert!(matches!(decode("/", "camera_make=Canon"), Err(DecodeError::MalformedQuery(_))));
        assert!(matches!(decode("/", "color="), Err(DecodeError::MalformedQuery(_))));
    }

    #[test]
    fn year_and_day_without_month_is_valid() {
        let state = decode("/2024", "day=15").unwrap();
        assert_eq!((state.year(), state.month(), state.day()), (Some(2024), None, Some(15)));
        assert_eq!(canonical_url(&state), "/2024?day=15");

        let orphan = FilterState::new().with_month(3).with_day(9);
        assert_eq!(canonical_url(&orphan), "/?month=3&day=9");
        assert_eq!(decode("/", "month=3&day=9").unwrap(), orphan);
    }

    #[test]
    fn in_burst_round_trips() {
        let state = decode("/", "in_burst=0").unwrap();
        assert_eq!(state.in_burst(), Some(false));
        assert_eq!(canonical_url(&state), "/?in_burst=false");
    }

    #[test]
    fn pagination_is_kept_out_of_the_canonical_url() {
        let state = decode("/2024", "page=3&limit=20").unwrap();
        assert_eq!(state.offset(), 40);
        assert_eq!(state.limit(), 20);
        assert_eq!(canonical_url(&state), "/2024");
        assert_eq!(page_url(&state, 4), "/2024?page=4&limit=20");
        assert_eq!(page_url(&FilterState::new(), 1), "/");
        assert_eq!(decode("/2024", "page=4&limit=20").unwrap(), state.with_page(4));
    }

    #[test]
    fn escapes_reserved_characters_in_values() {
        let state = FilterState::new().with_lens("EF 24-70mm f/2.8L, II").with_camera("A&B", "X/Y?");
        let url = canonical_url(&state);
        assert_eq!(url, "/camera/A%26B/X%2FY%3F?lens=EF%2024-70mm%20f%2F2.8L%2C%20II");
        let (path, query) = url.split_once('?').unwrap();
        assert_eq!(decode(path, query).unwrap(), state);
    }

    #[test]
    fn plus_decodes_to_space_in_query() {
        let state = decode("/", "lens=RF+50mm").unwrap();
        assert!(state.lens_model().contains("RF 50mm"));
    }

    fn split(url: &str) -> (&str, &str) {
        url.split_once('?').unwrap_or((url, ""))
    }

    fn text_set() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[A-Za-z0-9 ,/%+&?#._~-]{1,10}", 0..3)
    }

    prop_compose! {
        fn filter_state()(
            year in prop::option::of(1i32..=9999),
            month in prop::option::of(1u32..=12),
            day in prop::option::of(1u32..=31),
            camera in prop::option::of(("[A-Za-z0-9 /%&?-]{1,8}", "[A-Za-z0-9 /%&?-]{1,8}")),
            lenses in text_set(),
            colours in text_set(),
            times in text_set(),
            seasons in text_set(),
            focals in text_set(),
            conditions in text_set(),
            in_burst in prop::option::of(any::<bool>()),
        ) -> FilterState {
            let mut state = FilterState::new();
            if let Some(y) = year { state = state.with_year(y); }
            if let Some(m) = month { state = state.with_month(m); }
            if let Some(d) = day { state = state.with_day(d); }
            if let Some((make, model)) = camera { state = state.with_camera(make, model); }
            for v in lenses { state = state.with_lens(v); }
            for v in colours { state = state.with_colour(v); }
            for v in times { state = state.with_time_of_day(v); }
            for v in seasons { state = state.with_season(v); }
            for v in focals { state = state.with_focal_category(v); }
            for v in conditions { state = state.with_shooting_condition(v); }
            if let Some(b) = in_burst { state = state.with_in_burst(b); }
            state
        }
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(state in filter_state()) {
            let url = canonical_url(&state);
            let (path, query) = split(&url);
            prop_assert_eq!(decode(path, query).unwrap(), state);
        }

        #[test]
        fn re_encoding_is_idempotent(state in filter_state()) {
            let url = canonical_url(&state);
            let (path, query) = split(&url);
            let again = canonical_url(&decode(path, query).unwrap());
            prop_assert_eq!(again, url);
        }

        #[test]
        fn paginated_links_round_trip(state in filter_state(), page in 1u64..50, limit in 1u64..=MAX_PAGE_SIZE) {
            let state = state.with_limit(limit).with_page(page);
            let url = page_url(&state, page);
            let (path, query) = split(&url);
            prop_assert_eq!(decode(path, query).unwrap(), state);
        }
    }
}
