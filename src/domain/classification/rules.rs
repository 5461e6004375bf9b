/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Ordered keyword rule tables
//!
//! A rule table is a static slice of `(predicate, outcome)` pairs evaluated top
//! to bottom; the first matching rule wins. Keywords are written lowercase and
//! matched against lowercased input.

use std::collections::HashMap;

/// Text field a rule can inspect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Name,
    Description,
    DeviceId,
    VendorId,
    Manufacturer,
    Model,
    Interface,
    MediaType,
}

/// Lowercased text fields handed to a rule table
#[derive(Debug, Clone, Default)]
pub struct RuleInput {
    fields: HashMap<Field, String>,
}

impl RuleInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field; absent or blank values are left unset
    pub fn with(mut self, field: Field, value: Option<&str>) -> Self {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.fields.insert(field, v.to_lowercase());
        }
        self
    }

    pub fn field(&self, field: Field) -> &str {
        self.fields.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Predicate over a [`RuleInput`]
#[derive(Debug)]
pub enum Matcher {
    /// Field contains any keyword
    Contains(Field, &'static [&'static str]),
    /// Field contains any keyword as a whole word
    Word(Field, &'static [&'static str]),
    /// Field equals any value
    Equals(Field, &'static [&'static str]),
    /// Field starts with any prefix
    StartsWith(Field, &'static [&'static str]),
    AllOf(&'static [Matcher]),
    AnyOf(&'static [Matcher]),
    Not(&'static Matcher),
}

impl Matcher {
    pub fn matches(&self, input: &RuleInput) -> bool {
        match self {
            Matcher::Contains(field, keywords) => {
                let text = input.field(*field);
                !text.is_empty() && keywords.iter().any(|k| text.contains(k))
            }
            Matcher::Word(field, words) => input
                .field(*field)
                .split(|c: char| !c.is_ascii_alphanumeric())
                .any(|token| words.iter().any(|w| *w == token)),
            Matcher::Equals(field, values) => {
                let text = input.field(*field);
                values.iter().any(|v| text == *v)
            }
            Matcher::StartsWith(field, prefixes) => {
                let text = input.field(*field);
                !text.is_empty() && prefixes.iter().any(|p| text.starts_with(p))
            }
            Matcher::AllOf(matchers) => matchers.iter().all(|m| m.matches(input)),
            Matcher::AnyOf(matchers) => matchers.iter().any(|m| m.matches(input)),
            Matcher::Not(matcher) => !matcher.matches(input),
        }
    }
}

/// One `(predicate, outcome)` pair
#[derive(Debug)]
pub struct Rule<T: 'static> {
    pub when: Matcher,
    pub then: T,
}

/// Outcome of the first rule whose predicate matches
pub fn first_match<'a, T>(rules: &'a [Rule<T>], input: &RuleInput) -> Option<&'a T> {
    rules
        .iter()
        .find(|rule| rule.when.matches(input))
        .map(|rule| &rule.then)
}

#[cfg(test)]
mod tests {
    use super::*;

    static RULES: &[Rule<&str>] = &[
        Rule {
            when: Matcher::AllOf(&[
                Matcher::Contains(Field::Name, &["intel"]),
                Matcher::Not(&Matcher::Contains(Field::Name, &["arc"])),
            ]),
            then: "intel-igpu",
        },
        Rule {
            when: Matcher::Word(Field::Manufacturer, &["ati"]),
            then: "ati",
        },
        Rule {
            when: Matcher::AnyOf(&[
                Matcher::Equals(Field::VendorId, &["0x8087"]),
                Matcher::StartsWith(Field::Model, &["ddr"]),
            ]),
            then: "either",
        },
    ];

    #[test]
    fn test_first_matching_rule_wins() {
        let input = RuleInput::new()
            .with(Field::Name, Some("Intel UHD"))
            .with(Field::Manufacturer, Some("ATI"));
        assert_eq!(first_match(RULES, &input), Some(&"intel-igpu"));
    }

    #[test]
    fn test_negation_and_word_boundaries() {
        let arc = RuleInput::new()
            .with(Field::Name, Some("Intel Arc A770"))
            .with(Field::Manufacturer, Some("Intel Corporation"));
        // "corporation" contains "ati" but not as a word
        assert_eq!(first_match(RULES, &arc), None);

        let ati = RuleInput::new().with(Field::Manufacturer, Some("AMD/ATI"));
        assert_eq!(first_match(RULES, &ati), Some(&"ati"));
    }

    #[test]
    fn test_any_of_and_prefix() {
        let vid = RuleInput::new().with(Field::VendorId, Some("0x8087"));
        assert_eq!(first_match(RULES, &vid), Some(&"either"));
        let model = RuleInput::new().with(Field::Model, Some("  DDR5 "));
        assert_eq!(first_match(RULES, &model), Some(&"either"));
    }

    #[test]
    fn test_blank_fields_never_match() {
        let input = RuleInput::new().with(Field::Name, Some("   ")).with(Field::Model, None);
        assert!(input.is_empty());
        assert_eq!(first_match(RULES, &input), None);
    }
}
