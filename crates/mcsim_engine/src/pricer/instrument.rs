//! Payoff and exercise descriptors.

use mcsim_core::{SimulationError, Time};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Call or put.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    /// Pays when the underlying ends (or goes) above the strike.
    Call,
    /// Pays when the underlying ends (or goes) below the strike.
    Put,
}

impl FromStr for OptionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "call" | "c" => Ok(OptionType::Call),
            "put" | "p" => Ok(OptionType::Put),
            _ => Err(format!("Unknown option type: {}", s)),
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "call"),
            OptionType::Put => write!(f, "put"),
        }
    }
}

/// Striked payoff on a terminal or touched underlying value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payoff {
    /// `max(S - K, 0)` for calls, `max(K - S, 0)` for puts.
    PlainVanilla {
        /// Call or put
        option_type: OptionType,
        /// Strike
        strike: f64,
    },
    /// Fixed `cash` amount when in the money.
    CashOrNothing {
        /// Call or put
        option_type: OptionType,
        /// Strike, also the barrier level for American exercise
        strike: f64,
        /// Amount paid
        cash: f64,
    },
}

impl Payoff {
    /// Returns the option type.
    pub fn option_type(&self) -> OptionType {
        match *self {
            Payoff::PlainVanilla { option_type, .. } | Payoff::CashOrNothing { option_type, .. } => {
                option_type
            }
        }
    }

    /// Returns the strike.
    pub fn strike(&self) -> f64 {
        match *self {
            Payoff::PlainVanilla { strike, .. } | Payoff::CashOrNothing { strike, .. } => strike,
        }
    }

    /// Returns the payoff for underlying value `spot`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mcsim_engine::pricer::{OptionType, Payoff};
    ///
    /// let call = Payoff::PlainVanilla { option_type: OptionType::Call, strike: 100.0 };
    /// assert_eq!(call.value(110.0), 10.0);
    ///
    /// let digital = Payoff::CashOrNothing { option_type: OptionType::Put, strike: 100.0, cash: 5.0 };
    /// assert_eq!(digital.value(90.0), 5.0);
    /// assert_eq!(digital.value(110.0), 0.0);
    /// ```
    pub fn value(&self, spot: f64) -> f64 {
        match *self {
            Payoff::PlainVanilla {
                option_type,
                strike,
            } => match option_type {
                OptionType::Call => (spot - strike).max(0.0),
                OptionType::Put => (strike - spot).max(0.0),
            },
            Payoff::CashOrNothing {
                option_type,
                strike,
                cash,
            } => {
                let in_the_money = match option_type {
                    OptionType::Call => spot >= strike,
                    OptionType::Put => spot <= strike,
                };
                if in_the_money {
                    cash
                } else {
                    0.0
                }
            }
        }
    }

    /// Checks that the strike (and cash amount) are usable.
    ///
    /// # Errors
    ///
    /// `InputValidation` for a non-positive or non-finite strike, or a
    /// non-finite cash amount.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let strike = self.strike();
        if !(strike.is_finite() && strike > 0.0) {
            return Err(SimulationError::input(format!(
                "strike must be positive and finite, got {}",
                strike
            )));
        }
        if let Payoff::CashOrNothing { cash, .. } = *self {
            if !cash.is_finite() {
                return Err(SimulationError::input("cash amount must be finite"));
            }
        }
        Ok(())
    }
}

/// Exercise schedule in year fractions from the reference date.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Exercise {
    /// Exercise at a single date.
    European {
        /// Exercise time
        date: Time,
    },
    /// Exercise at any time in `[earliest, latest]`.
    American {
        /// First exercise time
        earliest: Time,
        /// Last exercise time
        latest: Time,
    },
}

impl Exercise {
    /// Returns the last exercise time.
    pub fn last_date(&self) -> Time {
        match *self {
            Exercise::European { date } => date,
            Exercise::American { latest, .. } => latest,
        }
    }

    /// Returns the first exercise time.
    pub fn first_date(&self) -> Time {
        match *self {
            Exercise::European { date } => date,
            Exercise::American { earliest, .. } => earliest,
        }
    }

    /// Returns the times that must be grid points.
    pub fn mandatory_times(&self) -> Vec<Time> {
        match *self {
            Exercise::European { date } => vec![date],
            Exercise::American { earliest, latest } if earliest > 0.0 && earliest < latest => {
                vec![earliest, latest]
            }
            Exercise::American { latest, .. } => vec![latest],
        }
    }

    /// Checks ordering and sign of the exercise times.
    ///
    /// # Errors
    ///
    /// `InputValidation` if a time is negative or non-finite, the last
    /// exercise time is not positive, or `earliest > latest`.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let (first, last) = (self.first_date(), self.last_date());
        if !(first.is_finite() && last.is_finite()) || first < 0.0 {
            return Err(SimulationError::input(format!(
                "exercise times must be non-negative and finite, got [{}, {}]",
                first, last
            )));
        }
        if last <= 0.0 {
            return Err(SimulationError::input("last exercise time must be positive"));
        }
        if first > last {
            return Err(SimulationError::input(format!(
                "earliest exercise {} after latest {}",
                first, last
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_vanilla_values() {
        let put = Payoff::PlainVanilla {
            option_type: OptionType::Put,
            strike: 100.0,
        };
        assert_eq!(put.value(80.0), 20.0);
        assert_eq!(put.value(120.0), 0.0);
        assert_eq!(put.option_type(), OptionType::Put);
        assert_eq!(put.strike(), 100.0);
    }

    #[test]
    fn test_cash_or_nothing_at_strike_pays() {
        let call = Payoff::CashOrNothing {
            option_type: OptionType::Call,
            strike: 100.0,
            cash: 1.0,
        };
        assert_eq!(call.value(100.0), 1.0);
        assert_eq!(call.value(99.99), 0.0);
    }

    #[test]
    fn test_payoff_validation() {
        let bad = Payoff::PlainVanilla {
            option_type: OptionType::Call,
            strike: 0.0,
        };
        assert!(matches!(bad.validate(), Err(SimulationError::InputValidation(_))));
        let bad_cash = Payoff::CashOrNothing {
            option_type: OptionType::Call,
            strike: 1.0,
            cash: f64::INFINITY,
        };
        assert!(bad_cash.validate().is_err());
    }

    #[test]
    fn test_exercise_mandatory_times() {
        assert_eq!(Exercise::European { date: 1.0 }.mandatory_times(), vec![1.0]);
        assert_eq!(
            Exercise::American {
                earliest: 0.0,
                latest: 2.0
            }
            .mandatory_times(),
            vec![2.0]
        );
        assert_eq!(
            Exercise::American {
                earliest: 0.5,
                latest: 2.0
            }
            .mandatory_times(),
            vec![0.5, 2.0]
        );
    }

    #[test]
    fn test_exercise_validation() {
        assert!(Exercise::European { date: 1.0 }.validate().is_ok());
        assert!(Exercise::European { date: 0.0 }.validate().is_err());
        assert!(Exercise::American {
            earliest: 2.0,
            latest: 1.0
        }
        .validate()
        .is_err());
        assert!(Exercise::American {
            earliest: -0.1,
            latest: 1.0
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_option_type_parse() {
        assert_eq!("Call".parse::<OptionType>().unwrap(), OptionType::Call);
        assert_eq!("p".parse::<OptionType>().unwrap(), OptionType::Put);
        assert!("straddle".parse::<OptionType>().is_err());
    }
}
