//! Intent Router - free-text question to intent mapping
//!
//! Classification is an ordered, flat list of rules. Each rule looks at the
//! question (and, for the data-dependent rules, the index) and either claims
//! it with an `Intent` carrying the extracted parameters, or passes. The first
//! rule that claims the question wins; nothing is scored.

use candict_shared::DiagnosticIndex;
use once_cell::sync::Lazy;
use regex::Regex;

/// Dataset category named in count and enumeration questions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    BusTypes,
    Manufacturers,
    Signals,
    FlashCodes,
}

/// Question intent, with whatever parameters the rule extracted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Nothing was asked
    Empty,
    /// Greeting or bare "help"
    Greeting,
    /// "how many ..." over a category, optionally scoped to one object
    Count {
        category: Category,
        object_id: Option<String>,
    },
    /// "list ..." over a category, optionally scoped to one object
    Enumerate {
        category: Category,
        object_id: Option<String>,
    },
    /// Composite report for one object id
    ObjectLookup { object_id: String },
    /// Flash code to object report
    FlashCodeLookup { flash_code: String },
    /// Objects on a given bus type
    BusTypeFilter { bus_type: String },
    /// Objects with hardware from a manufacturer; terms in match order
    ManufacturerFilter { terms: Vec<String> },
    /// Distinct severity levels
    Severities,
    /// Description substring search on the first term with matches
    DescriptionSearch { term: String },
    /// Explanatory question delegated to the text generator
    Explain { object_id: String, term: String },
    /// No rule matched
    Unclear(String),
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Empty => "empty",
            Intent::Greeting => "greeting",
            Intent::Count { .. } => "count",
            Intent::Enumerate { .. } => "enumerate",
            Intent::ObjectLookup { .. } => "object_lookup",
            Intent::FlashCodeLookup { .. } => "flash_code_lookup",
            Intent::BusTypeFilter { .. } => "bus_type_filter",
            Intent::ManufacturerFilter { .. } => "manufacturer_filter",
            Intent::Severities => "severities",
            Intent::DescriptionSearch { .. } => "description_search",
            Intent::Explain { .. } => "explain",
            Intent::Unclear(_) => "unclear",
        }
    }
}

/// What the data-dependent rules may consult
pub struct RouteContext<'a> {
    pub index: &'a DiagnosticIndex,
    /// Whether a text generator is configured
    pub collaborator: bool,
}

/// A question pre-normalized once for all rules
pub struct Question<'a> {
    /// Trimmed original text; identifiers are extracted from here
    pub raw: &'a str,
    /// Lowercased
    pub lower: String,
    /// Lowercased, with whitespace, '_' and '-' removed ("bus type" -> "bustype")
    pub compact: String,
    /// Lowercased alphanumeric words, in order
    pub words: Vec<String>,
}

impl<'a> Question<'a> {
    pub fn new(input: &'a str) -> Self {
        let raw = input.trim();
        let lower = raw.to_lowercase();
        let compact = lower
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect();
        let words = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            raw,
            lower,
            compact,
            words,
        }
    }

    fn has_word(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    fn has_any_word(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.has_word(w))
    }
}

/// One entry of the ordered rule table
pub struct IntentRule {
    pub name: &'static str,
    pub classify: fn(&Question, &RouteContext) -> Option<Intent>,
}

/// Rules in precedence order
pub const RULES: &[IntentRule] = &[
    IntentRule { name: "empty", classify: rule_empty },
    IntentRule { name: "greeting", classify: rule_greeting },
    IntentRule { name: "count", classify: rule_count },
    IntentRule { name: "enumerate", classify: rule_enumerate },
    IntentRule { name: "object_lookup", classify: rule_object_lookup },
    IntentRule { name: "flash_code_lookup", classify: rule_flash_code },
    IntentRule { name: "bus_type_filter", classify: rule_bus_type },
    IntentRule { name: "manufacturer_filter", classify: rule_manufacturer },
    IntentRule { name: "severities", classify: rule_severities },
    IntentRule { name: "description_search", classify: rule_description_search },
    IntentRule { name: "explain", classify: rule_explain },
];

const GREETINGS: &[&str] = &["hi", "hello", "hey", "help", "start", "?"];

const EXPLAIN_CUES: &[&str] = &["why", "how", "explain", "troubleshoot", "help"];

/// Long search terms never include these
const SEARCH_STUTTER: &[&str] = &["show", "find", "search"];

/// Short (3-4 char) words that are never search terms
const SHORT_STOPWORDS: &[&str] = &[
    "all", "and", "any", "are", "can", "does", "find", "for", "from", "get", "give", "has",
    "have", "how", "into", "its", "list", "show", "tell", "that", "the", "them", "then",
    "this", "what", "when", "who", "why", "with", "you", "your", "was", "were",
];

/// Identifier-shaped bare numeral: at least 4 digits
static BARE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{4,}\b").expect("valid bare id regex"));

static OBJECT_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:object[\s_-]*id|id)\b\s*[:#=]?\s*([A-Za-z0-9][A-Za-z0-9_.-]*)")
        .expect("valid object id regex")
});

static FLASH_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bflash[\s_-]*codes?\b\s*[:#=]?\s*([A-Za-z0-9][A-Za-z0-9_-]*)")
        .expect("valid flash code regex")
});

static BUS_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bbus[\s_-]*types?\b\s*[:#=]?\s*(\d+)\b").expect("valid bus type regex")
});

/// Route a question to the first matching intent
pub fn route_intent(input: &str, ctx: &RouteContext) -> Intent {
    let question = Question::new(input);
    RULES
        .iter()
        .find_map(|rule| (rule.classify)(&question, ctx))
        .unwrap_or_else(|| Intent::Unclear(question.raw.to_string()))
}

/// Name of the rule that claims the question, if any
pub fn matching_rule(input: &str, ctx: &RouteContext) -> Option<&'static str> {
    let question = Question::new(input);
    RULES
        .iter()
        .find(|rule| (rule.classify)(&question, ctx).is_some())
        .map(|rule| rule.name)
}

// === Rules ===

fn rule_empty(q: &Question, _ctx: &RouteContext) -> Option<Intent> {
    q.raw.is_empty().then_some(Intent::Empty)
}

fn rule_greeting(q: &Question, _ctx: &RouteContext) -> Option<Intent> {
    let token = if q.lower == "?" {
        q.lower.as_str()
    } else {
        q.lower.trim_end_matches(['!', '.'])
    };
    GREETINGS.contains(&token).then_some(Intent::Greeting)
}

fn rule_count(q: &Question, _ctx: &RouteContext) -> Option<Intent> {
    if !has_count_cue(q) {
        return None;
    }
    let category = category_of(q)?;
    Some(Intent::Count {
        category,
        object_id: scoped_object_id(q, category),
    })
}

fn rule_enumerate(q: &Question, _ctx: &RouteContext) -> Option<Intent> {
    if !has_list_cue(q) {
        return None;
    }
    let category = category_of(q)?;
    Some(Intent::Enumerate {
        category,
        object_id: scoped_object_id(q, category),
    })
}

fn rule_object_lookup(q: &Question, ctx: &RouteContext) -> Option<Intent> {
    extract_object_id(q.raw, |token| ctx.index.contains(token))
        .map(|object_id| Intent::ObjectLookup { object_id })
}

fn rule_flash_code(q: &Question, ctx: &RouteContext) -> Option<Intent> {
    let code = capture_marker_token(&FLASH_CODE_RE, q.raw, |token| {
        ctx.index.id_for_flash_code(token).is_some()
    })?;
    Some(Intent::FlashCodeLookup { flash_code: code })
}

fn rule_bus_type(q: &Question, _ctx: &RouteContext) -> Option<Intent> {
    let bus_type = capture_marker_token(&BUS_TYPE_RE, q.raw, |_| false)?;
    Some(Intent::BusTypeFilter { bus_type })
}

fn rule_manufacturer(q: &Question, ctx: &RouteContext) -> Option<Intent> {
    let mentions_known = ctx
        .index
        .manufacturers()
        .iter()
        .any(|m| mentions_name(q, m));

    if !q.lower.contains("manufacturer") && !mentions_known {
        return None;
    }

    Some(Intent::ManufacturerFilter {
        terms: manufacturer_terms(q, ctx),
    })
}

fn rule_severities(q: &Question, _ctx: &RouteContext) -> Option<Intent> {
    let asks = has_list_cue(q) || q.has_any_word(&["what", "which", "all", "show"]);
    (q.lower.contains("severit") && asks).then_some(Intent::Severities)
}

fn rule_description_search(q: &Question, ctx: &RouteContext) -> Option<Intent> {
    search_terms(q)
        .into_iter()
        .find(|term| !ctx.index.search_descriptions(term).is_empty())
        .map(|term| Intent::DescriptionSearch { term })
}

fn rule_explain(q: &Question, ctx: &RouteContext) -> Option<Intent> {
    if !ctx.collaborator || !q.has_any_word(EXPLAIN_CUES) {
        return None;
    }

    search_terms(q).into_iter().find_map(|term| {
        let related = ctx
            .index
            .search_descriptions(&term)
            .first()
            .map(|(id, _)| id.to_string())
            .or_else(|| {
                ctx.index
                    .search_corrective_actions(&term)
                    .first()
                    .map(|id| id.to_string())
            })?;
        Some(Intent::Explain {
            object_id: related,
            term,
        })
    })
}

// === Cue helpers ===

fn has_count_cue(q: &Question) -> bool {
    q.lower.contains("how many") || q.lower.contains("number of") || q.has_word("count")
}

fn has_list_cue(q: &Question) -> bool {
    q.has_word("list") || q.lower.contains("show all") || q.has_word("enumerate")
}

fn category_of(q: &Question) -> Option<Category> {
    if q.compact.contains("bustype") {
        Some(Category::BusTypes)
    } else if q.lower.contains("manufacturer") {
        Some(Category::Manufacturers)
    } else if q.compact.contains("flashcode")
        || q.has_any_word(&["fault", "faults", "exception", "exceptions"])
    {
        Some(Category::FlashCodes)
    } else if q.lower.contains("signal") || q.lower.contains("object") {
        Some(Category::Signals)
    } else {
        None
    }
}

/// Only bus-type counts and listings can be scoped to one object
fn scoped_object_id(q: &Question, category: Category) -> Option<String> {
    if category != Category::BusTypes {
        return None;
    }
    let masked = BUS_TYPE_RE.replace_all(q.raw, " ");
    BARE_ID_RE.find(&masked).map(|m| m.as_str().to_string())
}

/// First token after a marker that is a known key, or else contains a digit
fn capture_marker_token(re: &Regex, text: &str, known: impl Fn(&str) -> bool) -> Option<String> {
    let tokens: Vec<String> = re
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| clean_token(m.as_str()))
        .collect();

    tokens
        .iter()
        .find(|token| known(token.as_str()))
        .or_else(|| {
            tokens
                .iter()
                .find(|token| token.chars().any(|c| c.is_ascii_digit()))
        })
        .cloned()
}

fn clean_token(token: &str) -> String {
    token.trim_end_matches(['.', '-', '_']).to_string()
}

/// Object id from an explicit marker, else a bare numeral not claimed by a
/// flash-code or bus-type marker. A marker token is taken when `known`
/// accepts it or when it contains a digit.
pub fn extract_object_id(raw: &str, known: impl Fn(&str) -> bool) -> Option<String> {
    if let Some(id) = capture_marker_token(&OBJECT_ID_RE, raw, known) {
        return Some(id);
    }

    let masked = FLASH_CODE_RE.replace_all(raw, " ");
    let masked = BUS_TYPE_RE.replace_all(&masked, " ");
    BARE_ID_RE.find(&masked).map(|m| m.as_str().to_string())
}

/// Whole-word (or whole-phrase) mention of a name, case-insensitive
fn mentions_name(q: &Question, name: &str) -> bool {
    let name_words: Vec<String> = name
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();

    let joined: String = name_words.concat();
    if joined.chars().count() < 3 {
        return false;
    }

    q.words
        .windows(name_words.len())
        .any(|window| window == name_words.as_slice())
}

/// Search terms for the manufacturer filter, most specific first: the text
/// after "manufacturer" with leading filler dropped, then known names the
/// question mentions as whole words. The cue word never ends up in a term.
fn manufacturer_terms(q: &Question, ctx: &RouteContext) -> Vec<String> {
    const FILLER: &[&str] = &["s", "is", "named", "called", "by", "from", "for", "of", "the"];
    let mut terms = Vec::new();

    if let Some(pos) = q.lower.rfind("manufacturer") {
        let rest = &q.lower[pos + "manufacturer".len()..];
        let remainder = rest
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .skip_while(|w| FILLER.contains(w))
            .collect::<Vec<_>>()
            .join(" ");
        if !remainder.is_empty() {
            terms.push(remainder);
        }
    }

    for name in ctx.index.manufacturers() {
        let name = name.to_lowercase();
        if mentions_name(q, &name) && !terms.contains(&name) {
            terms.push(name);
        }
    }
    terms
}

/// Candidate description-search terms: words longer than 4 characters first,
/// then 3-4 character words that are not stopwords, each in question order
pub fn search_terms(q: &Question) -> Vec<String> {
    let long = q
        .words
        .iter()
        .filter(|w| w.chars().count() > 4 && !SEARCH_STUTTER.contains(&w.as_str()));
    let short = q.words.iter().filter(|w| {
        let n = w.chars().count();
        (3..=4).contains(&n) && !SHORT_STOPWORDS.contains(&w.as_str())
    });

    let mut terms: Vec<String> = Vec::new();
    for w in long.chain(short) {
        if !terms.contains(w) {
            terms.push(w.clone());
        }
    }
    terms
}

/// Fixed help text for greetings
pub fn help_response() -> String {
    "Hello! I answer questions about the loaded CAN data dictionary.\n\n\
     You can ask about:\n\
     • Counts: \"How many BusTypes are present?\"\n\
     • Listings: \"List all BusTypes\", \"list manufacturers\"\n\
     • Objects: \"objectid 1234\"\n\
     • Flash codes: \"flash code 523\"\n\
     • Bus types: \"Show BusType 38\"\n\
     • Manufacturers: \"manufacturer Bosch\"\n\
     • Severities: \"list severities\"\n\
     • Descriptions: \"search for oil\""
        .to_string()
}

/// Fixed message when no rule applies
pub fn unclear_response() -> String {
    "Query not understood. Try one of these:\n\
     • How many BusTypes are present?\n\
     • List all BusTypes\n\
     • Show BusType 38\n\
     • What's in BusType 47?\n\
     • objectid 1234\n\
     • flash code 523\n\
     • manufacturer Bosch\n\
     • search for oil"
        .to_string()
}
