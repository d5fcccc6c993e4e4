//! The Portuguese replies shown to the user.

use rust_decimal::Decimal;

use crate::{
    Error,
    ledger::Commit,
    movement::Kind,
    parser::{Candidate, InputFormat},
    report::{ReportGrouping, ReportSummary},
};

/// The reply when a decision arrives for a confirmation that is gone.
pub const ALREADY_PROCESSED: &str = "Esta operação já foi processada.";

/// The reply when the user cancels.
pub const CANCELLED: &str = "Operação cancelada.";

/// The reply when the user rejects a candidate.
pub const DISCARDED: &str = "Lançamento descartado.";

/// The reply when text arrives while nothing is pending.
pub const NOTHING_PENDING: &str = "Escolha uma opção no menu primeiro.";

/// The prompt for a month selection.
pub const MONTH_PROMPT: &str = "Digite o mês e o ano no formato MM AAAA, ex: 01 2026";

/// Format `value` as money, e.g. `R$ 100.50`.
pub fn money(value: Decimal) -> String {
    format!("R$ {:.2}", value.round_dp(2))
}

fn kind_word(kind: Kind) -> String {
    kind.label().to_lowercase()
}

/// Ask for the amount and description of a movement of `kind`.
pub fn input_prompt(kind: Kind, format: InputFormat) -> String {
    let fields = match format {
        InputFormat::AmountFirst => "o valor e a descrição separados por espaço",
        InputFormat::Delimited => "valor; descrição; categoria",
    };

    format!(
        "Digite {fields} da {}, ex: {}",
        kind_word(kind),
        format.example(kind)
    )
}

/// Ask the user to confirm `candidate`.
pub fn confirmation_prompt(candidate: &Candidate) -> String {
    let mut prompt = format!(
        "Confirme {}: {} - {}",
        kind_word(candidate.kind),
        money(candidate.amount.as_decimal()),
        candidate.description
    );

    if let Some(category) = &candidate.category {
        prompt.push_str(&format!(" ({category})"));
    }

    prompt
}

/// Tell the user a movement was recorded.
pub fn committed(commit: &Commit) -> String {
    format!(
        "{} registrada: {} - {}\nSaldo atual: {}",
        commit.movement.kind.label(),
        money(commit.movement.amount.as_decimal()),
        commit.movement.description,
        money(commit.balance)
    )
}

/// Show the balance.
pub fn balance(balance: Decimal) -> String {
    format!("Saldo atual: {}", money(balance))
}

/// Explain a failed request in words the user can act on.
///
/// `format` is used to show an example for input errors.
pub fn error_reply(error: &Error, kind: Option<Kind>, format: InputFormat) -> String {
    let example = kind
        .map(|kind| format!(" Exemplo: {}", format.example(kind)))
        .unwrap_or_default();

    match error {
        Error::InvalidAmount(text) => {
            format!("Valor inválido: \"{text}\". Use um número maior que zero.{example}")
        }
        Error::WrongFieldCount(count) => format!(
            "Formato inválido: esperava 3 campos separados por ';', recebi {count}.{example}"
        ),
        Error::EmptyField(position) => {
            format!("Formato inválido: o campo {position} está vazio.{example}")
        }
        Error::InvalidPeriod(text) => format!("Mês inválido: \"{text}\". {MONTH_PROMPT}"),
        Error::StaleConfirmation => ALREADY_PROCESSED.to_owned(),
        Error::NothingPending => NOTHING_PENDING.to_owned(),
        Error::StorageTransient(_) | Error::StorageFatal { .. } => {
            "Não foi possível salvar agora. Tente confirmar novamente.".to_owned()
        }
        _ => "Ocorreu um erro inesperado.".to_owned(),
    }
}

/// Render a report as text.
pub fn report(summary: &ReportSummary) -> String {
    let mut lines = vec![format!("Relatório de {}", summary.period)];

    match summary.grouping {
        ReportGrouping::Kind => {
            lines.push(format!("Entradas: {}", money(summary.income)));
            lines.push(format!("Saídas: {}", money(summary.expense)));
        }
        ReportGrouping::Category => {
            for kind in [Kind::Income, Kind::Expense] {
                lines.push(format!("{}:", kind.label()));

                for line in summary.totals.iter().filter(|line| line.kind == kind) {
                    lines.push(format!("  {}: {}", line.label, money(line.total)));
                }
            }
        }
    }

    lines.push(format!("Resultado: {}", money(summary.net)));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        Error,
        ledger::{Commit, Scope},
        messages::{confirmation_prompt, committed, error_reply, input_prompt, money, report},
        movement::{Amount, Kind, Movement},
        parser::{Candidate, InputFormat},
        report::{Period, ReportGrouping, summarize},
    };

    fn candidate(kind: Kind, cents: i64, description: &str) -> Candidate {
        Candidate {
            kind,
            amount: Amount::from_cents_unchecked(cents),
            description: description.to_owned(),
            category: None,
        }
    }

    #[test]
    fn money_has_two_decimal_places() {
        assert_eq!(money(Decimal::new(1005, 1)), "R$ 100.50");
        assert_eq!(money(Decimal::new(-25, 0)), "R$ -25.00");
    }

    #[test]
    fn confirmation_prompt_shows_amount_and_description() {
        let prompt = confirmation_prompt(&candidate(Kind::Income, 10_000, "Venda"));

        assert_eq!(prompt, "Confirme entrada: R$ 100.00 - Venda");
    }

    #[test]
    fn confirmation_prompt_shows_category() {
        let mut candidate = candidate(Kind::Expense, 10_050, "Aluguel");
        candidate.category = Some("Moradia".to_owned());

        assert_eq!(
            confirmation_prompt(&candidate),
            "Confirme saída: R$ 100.50 - Aluguel (Moradia)"
        );
    }

    #[test]
    fn input_prompt_shows_example_for_format() {
        let prompt = input_prompt(Kind::Expense, InputFormat::Delimited);

        assert!(prompt.contains("100,50;Aluguel;Moradia"), "got {prompt}");
    }

    #[test]
    fn committed_shows_new_balance() {
        let commit = Commit {
            movement: Movement {
                id: 1,
                scope: Scope::Global,
                kind: Kind::Expense,
                amount: Amount::from_cents_unchecked(2_500),
                description: "Lanche".to_owned(),
                category: "Saída".to_owned(),
                occurred_at: date!(2026 - 01 - 10),
            },
            balance: Decimal::new(7_500, 2),
        };

        assert_eq!(
            committed(&commit),
            "Saída registrada: R$ 25.00 - Lanche\nSaldo atual: R$ 75.00"
        );
    }

    #[test]
    fn input_errors_include_example() {
        let reply = error_reply(
            &Error::InvalidAmount("abc".to_owned()),
            Some(Kind::Income),
            InputFormat::AmountFirst,
        );

        assert!(reply.contains("\"abc\""), "got {reply}");
        assert!(reply.contains("100 Venda"), "got {reply}");
    }

    #[test]
    fn field_count_reply_shows_count_typed() {
        let reply = error_reply(
            &Error::WrongFieldCount(4),
            Some(Kind::Expense),
            InputFormat::Delimited,
        );

        assert!(reply.contains("recebi 4"), "got {reply}");
        assert!(reply.contains("100,50;Aluguel;Moradia"), "got {reply}");
    }

    #[test]
    fn empty_field_reply_names_the_field() {
        let reply = error_reply(&Error::EmptyField(2), Some(Kind::Expense), InputFormat::Delimited);

        assert!(reply.contains("o campo 2 está vazio"), "got {reply}");
    }

    #[test]
    fn kind_report_lists_totals_and_net() {
        let period = Period::new(1, 2026).unwrap();
        let summary = summarize(period, ReportGrouping::Kind, &[]);

        assert_eq!(
            report(&summary),
            "Relatório de 01/2026\nEntradas: R$ 0.00\nSaídas: R$ 0.00\nResultado: R$ 0.00"
        );
    }
}
