//! Turns a line of user text into a candidate movement.
//!
//! Two input formats are supported, the deployment picks one:
//! - amount first: `100 Venda`, the rest of the line is the description,
//! - delimited: `100,50;Aluguel;Moradia`, exactly amount, description and category.

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    movement::{Amount, Kind},
};

/// The separator between fields in [InputFormat::Delimited].
pub const FIELD_DELIMITER: char = ';';

/// The number of fields required by [InputFormat::Delimited].
const DELIMITED_FIELD_COUNT: usize = 3;

/// How a movement is typed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    /// A number followed by an optional free text description.
    #[default]
    AmountFirst,
    /// `amount; description; category`.
    Delimited,
}

impl InputFormat {
    /// An example of the format, used in prompts.
    pub fn example(self, kind: Kind) -> &'static str {
        match (self, kind) {
            (InputFormat::AmountFirst, Kind::Income) => "100 Venda",
            (InputFormat::AmountFirst, Kind::Expense) => "35,90 Mercado",
            (InputFormat::Delimited, Kind::Income) => "2500;Salário;Trabalho",
            (InputFormat::Delimited, Kind::Expense) => "100,50;Aluguel;Moradia",
        }
    }
}

/// A parsed movement that has not been confirmed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Whether money came in or went out.
    pub kind: Kind,
    /// How much money moved.
    pub amount: Amount,
    /// What the movement was for.
    pub description: String,
    /// The report category, if the user typed one.
    pub category: Option<String>,
}

/// Parse `text` as a movement of `expected_kind`.
///
/// # Errors
///
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is not a positive number,
/// - [Error::WrongFieldCount] if delimited input does not have exactly three fields,
/// - or [Error::EmptyField] if one of the three fields is blank.
pub fn parse(text: &str, expected_kind: Kind, format: InputFormat) -> Result<Candidate, Error> {
    match format {
        InputFormat::AmountFirst => parse_amount_first(text, expected_kind),
        InputFormat::Delimited => parse_delimited(text, expected_kind),
    }
}

fn parse_amount_first(text: &str, kind: Kind) -> Result<Candidate, Error> {
    let mut tokens = text.split_whitespace();

    let amount = match tokens.next() {
        Some(token) => Amount::parse(token)?,
        None => return Err(Error::InvalidAmount(text.to_owned())),
    };

    let description = tokens.collect::<Vec<_>>().join(" ");
    let description = if description.is_empty() {
        kind.label().to_owned()
    } else {
        description
    };

    Ok(Candidate {
        kind,
        amount,
        description,
        category: None,
    })
}

fn parse_delimited(text: &str, kind: Kind) -> Result<Candidate, Error> {
    let fields: Vec<&str> = text.split(FIELD_DELIMITER).map(str::trim).collect();

    if fields.len() != DELIMITED_FIELD_COUNT {
        return Err(Error::WrongFieldCount(fields.len()));
    }

    if let Some(position) = fields.iter().position(|field| field.is_empty()) {
        return Err(Error::EmptyField(position + 1));
    }

    Ok(Candidate {
        kind,
        amount: Amount::parse(fields[0])?,
        description: fields[1].to_owned(),
        category: Some(fields[2].to_owned()),
    })
}


#[cfg(test)]
mod delimited_tests {
    use crate::{
        Error, ErrorKind,
        movement::{Amount, Kind},
        parser::{Candidate, InputFormat, parse},
    };

    #[test]
    fn parses_three_fields() {
        let candidate = parse("100,50;Aluguel;Moradia", Kind::Expense, InputFormat::Delimited);

        assert_eq!(
            candidate,
            Ok(Candidate {
                kind: Kind::Expense,
                amount: Amount::from_cents_unchecked(10_050),
                description: "Aluguel".to_owned(),
                category: Some("Moradia".to_owned()),
            })
        );
    }

    #[test]
    fn trims_fields() {
        let candidate = parse(" 12.5 ; Pão de queijo ;  Lanche ", Kind::Expense, InputFormat::Delimited)
            .unwrap();

        assert_eq!(candidate.amount, Amount::from_cents_unchecked(1_250));
        assert_eq!(candidate.description, "Pão de queijo");
        assert_eq!(candidate.category.as_deref(), Some("Lanche"));
    }

    #[test]
    fn two_fields_is_wrong_field_count() {
        let result = parse("100;Aluguel", Kind::Expense, InputFormat::Delimited);

        assert_eq!(result, Err(Error::WrongFieldCount(2)));
    }

    #[test]
    fn four_fields_is_wrong_field_count() {
        let result = parse("100;Aluguel;Moradia;Extra", Kind::Expense, InputFormat::Delimited);

        assert_eq!(result, Err(Error::WrongFieldCount(4)));
    }

    #[test]
    fn trailing_delimiter_counts_as_extra_field() {
        let result = parse("100;Aluguel;Moradia;", Kind::Expense, InputFormat::Delimited);

        assert_eq!(result, Err(Error::WrongFieldCount(4)));
    }

    #[test]
    fn empty_field_is_reported_by_position() {
        let result = parse("100;;Moradia", Kind::Expense, InputFormat::Delimited);

        assert_eq!(result, Err(Error::EmptyField(2)));
        assert_eq!(result.unwrap_err().kind(), ErrorKind::WrongFieldCount);
    }

    #[test]
    fn bad_amount_is_invalid_amount() {
        let result = parse("cem;Aluguel;Moradia", Kind::Expense, InputFormat::Delimited);

        assert_eq!(result, Err(Error::InvalidAmount("cem".to_owned())));
    }
}
