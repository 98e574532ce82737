//! Common types and step implementations for tests.
//!
//! This module contains:
//! - `Journal`: shared log of execute attempts and undos
//! - `Gate`: switch that makes a probe halt while closed
//! - `Probe`: leaf step recording into a journal
//! - The payment-need domain: `PersonDao`, `CreatePerson`, `FetchPersonalia`
//!   and the `PaymentNeed` composite declared with `composite!`

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::{composite, Composite, Context, Step, StepOutcome};

// ============================================================================
// Journal and Gate
// ============================================================================

/// Shared, ordered log of `exec:NAME` and `undo:NAME` entries.
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: String) {
        self.0.borrow_mut().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Names of executed steps (every attempt, halted or not), in order.
    pub fn executed(&self) -> Vec<String> {
        self.with_prefix("exec:")
    }

    /// Names of undone steps, in order.
    pub fn undone(&self) -> Vec<String> {
        self.with_prefix("undo:")
    }

    /// Number of execute attempts of `name`.
    pub fn attempts(&self, name: &str) -> usize {
        self.executed().iter().filter(|n| n.as_str() == name).count()
    }

    pub fn probe(&self, name: impl Into<String>) -> Probe {
        Probe {
            name: name.into(),
            journal: self.clone(),
            gate: None,
            report: None,
        }
    }

    fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter_map(|entry| entry.strip_prefix(prefix))
            .map(str::to_owned)
            .collect()
    }
}

/// A switch shared between a test and the probes it guards. Closed by default.
#[derive(Debug, Clone, Default)]
pub struct Gate(Rc<Cell<bool>>);

impl Gate {
    pub fn closed() -> Self {
        Self::default()
    }

    pub fn open(&self) {
        self.0.set(true);
    }

    pub fn is_open(&self) -> bool {
        self.0.get()
    }
}

// ============================================================================
// Probe Step
// ============================================================================

/// Leaf step that records each attempt and undo.
///
/// Halts while its gate is closed. Optionally reports a diagnostic on every
/// attempt.
pub struct Probe {
    name: String,
    journal: Journal,
    gate: Option<Gate>,
    report: Option<&'static str>,
}

impl Probe {
    pub fn gated(mut self, gate: &Gate) -> Self {
        self.gate = Some(gate.clone());
        self
    }

    pub fn reporting(mut self, message: &'static str) -> Self {
        self.report = Some(message);
        self
    }
}

impl Step for Probe {
    fn execute(&mut self, ctx: &mut Context) -> StepOutcome {
        self.journal.record(format!("exec:{}", self.name));
        if let Some(message) = self.report {
            ctx.report_error(message);
        }
        match &self.gate {
            Some(gate) if !gate.is_open() => StepOutcome::Halt,
            _ => StepOutcome::Continue,
        }
    }

    fn undo(&mut self) {
        self.journal.record(format!("undo:{}", self.name));
    }
}

/// Boxes any step for a dynamic composite.
pub trait Boxed: Step + Sized + 'static {
    fn boxed(self) -> Box<dyn Step> {
        Box::new(self)
    }
}

impl<S: Step + 'static> Boxed for S {}

/// Build a dynamic composite from boxed steps.
pub fn seq<const N: usize>(steps: [Box<dyn Step>; N]) -> Composite {
    steps.into_iter().collect()
}

// ============================================================================
// Payment Need Domain
// ============================================================================

/// In-memory person records.
#[derive(Debug, Clone, Default)]
pub struct PersonDao(Rc<RefCell<Vec<Person>>>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub fnr: String,
    pub name: Option<String>,
    pub address: Option<String>,
}

impl PersonDao {
    pub fn insert_person(&self, fnr: &str) -> bool {
        let mut people = self.0.borrow_mut();
        if people.iter().any(|p| p.fnr == fnr) {
            return false;
        }
        people.push(Person {
            fnr: fnr.to_owned(),
            name: None,
            address: None,
        });
        true
    }

    pub fn delete_person(&self, fnr: &str) {
        self.0.borrow_mut().retain(|p| p.fnr != fnr);
    }

    pub fn update_personalia(&self, fnr: &str, name: &str, address: &str) {
        if let Some(person) = self.0.borrow_mut().iter_mut().find(|p| p.fnr == fnr) {
            person.name = Some(name.to_owned());
            person.address = Some(address.to_owned());
        }
    }

    pub fn clear_personalia(&self, fnr: &str) {
        if let Some(person) = self.0.borrow_mut().iter_mut().find(|p| p.fnr == fnr) {
            person.name = None;
            person.address = None;
        }
    }

    pub fn find(&self, fnr: &str) -> Option<Person> {
        self.0.borrow().iter().find(|p| p.fnr == fnr).cloned()
    }
}

/// Creates the person record.
pub struct CreatePerson {
    pub dao: PersonDao,
    pub fnr: String,
}

impl Step for CreatePerson {
    fn execute(&mut self, ctx: &mut Context) -> StepOutcome {
        if !self.dao.insert_person(&self.fnr) {
            ctx.report_error(format!("person {} already exists", self.fnr));
        }
        StepOutcome::Continue
    }

    fn undo(&mut self) {
        self.dao.delete_person(&self.fnr);
    }
}

/// Name and address, delivered from outside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Personalia {
    pub name: String,
    pub address: String,
}

/// Stores personalia; halts until it has been provided.
pub struct FetchPersonalia {
    pub dao: PersonDao,
    pub fnr: String,
    pub personalia: Option<Personalia>,
}

impl FetchPersonalia {
    pub fn provide(&mut self, personalia: Personalia) {
        self.personalia = Some(personalia);
    }
}

impl Step for FetchPersonalia {
    fn execute(&mut self, _ctx: &mut Context) -> StepOutcome {
        let Some(info) = &self.personalia else {
            return StepOutcome::Halt;
        };
        self.dao.update_personalia(&self.fnr, &info.name, &info.address);
        StepOutcome::Continue
    }

    fn undo(&mut self) {
        self.dao.clear_personalia(&self.fnr);
    }
}

composite! {
    /// Registers a person and waits for their personalia.
    pub PaymentNeed {
        create_person: CreatePerson,
        personalia: FetchPersonalia,
    }
}

pub const FNR: &str = "12345678901";

/// Build a fresh, untouched payment need.
pub fn payment_need(dao: &PersonDao) -> PaymentNeed {
    PaymentNeed::new(PaymentNeedSteps {
        create_person: CreatePerson {
            dao: dao.clone(),
            fnr: FNR.to_owned(),
        },
        personalia: FetchPersonalia {
            dao: dao.clone(),
            fnr: FNR.to_owned(),
            personalia: None,
        },
    })
}

pub fn personalia() -> Personalia {
    Personalia {
        name: "Hello, World".to_owned(),
        address: "1337 Computer Road".to_owned(),
    }
}
