//! Payment need demo: halt on missing input, suspend, restart, resume, undo.
//!
//! Run with: cargo run --example payment_need
//! Set RUST_LOG=rewind=debug to see every step event.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use rewind::{composite, Case, CaseResult, Context, InMemoryStore, Step, StepOutcome};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, Default)]
struct Person {
    name: Option<String>,
    address: Option<String>,
    payment_account: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct PersonDao(Rc<RefCell<HashMap<String, Person>>>);

impl PersonDao {
    fn get(&self, fnr: &str) -> Option<Person> {
        self.0.borrow().get(fnr).cloned()
    }
}

#[derive(Debug, Clone)]
struct Personalia {
    name: String,
    address: String,
}

// ============================================================================
// Step implementations
// ============================================================================

/// Step 1: Create the person record
struct CreatePerson {
    dao: PersonDao,
    fnr: String,
}

impl Step for CreatePerson {
    fn execute(&mut self, ctx: &mut Context) -> StepOutcome {
        let mut people = self.dao.0.borrow_mut();
        if people.contains_key(&self.fnr) {
            ctx.report_error(format!("person {} already registered", self.fnr));
        } else {
            println!("  [CreatePerson] Registering {}", self.fnr);
            people.insert(self.fnr.clone(), Person::default());
        }
        StepOutcome::Continue
    }

    fn undo(&mut self) {
        println!("  [CreatePerson] Removing {}", self.fnr);
        self.dao.0.borrow_mut().remove(&self.fnr);
    }
}

/// Step 2: Store personalia, delivered later on the message bus
struct FetchPersonalia {
    dao: PersonDao,
    fnr: String,
    personalia: Option<Personalia>,
}

impl Step for FetchPersonalia {
    fn execute(&mut self, _ctx: &mut Context) -> StepOutcome {
        let Some(info) = &self.personalia else {
            println!("  [FetchPersonalia] No personalia yet, halting");
            return StepOutcome::Halt;
        };
        println!("  [FetchPersonalia] Storing personalia for {}", info.name);
        if let Some(person) = self.dao.0.borrow_mut().get_mut(&self.fnr) {
            person.name = Some(info.name.clone());
            person.address = Some(info.address.clone());
        }
        StepOutcome::Continue
    }

    fn undo(&mut self) {
        println!("  [FetchPersonalia] Clearing personalia");
        if let Some(person) = self.dao.0.borrow_mut().get_mut(&self.fnr) {
            person.name = None;
            person.address = None;
        }
    }
}

/// Step 3: Open a payment account
struct OpenAccount {
    dao: PersonDao,
    fnr: String,
}

impl Step for OpenAccount {
    fn execute(&mut self, _ctx: &mut Context) -> StepOutcome {
        let account = format!("ACC-{}", &self.fnr[..4]);
        println!("  [OpenAccount] Opening {}", account);
        if let Some(person) = self.dao.0.borrow_mut().get_mut(&self.fnr) {
            person.payment_account = Some(account);
        }
        StepOutcome::Continue
    }

    fn undo(&mut self) {
        println!("  [OpenAccount] Closing account");
        if let Some(person) = self.dao.0.borrow_mut().get_mut(&self.fnr) {
            person.payment_account = None;
        }
    }
}

composite! {
    /// Everything needed before a person can receive payments.
    PaymentNeed {
        create_person: CreatePerson,
        personalia: FetchPersonalia,
        open_account: OpenAccount,
    }
}

fn payment_need(dao: &PersonDao, fnr: &str) -> PaymentNeed {
    PaymentNeed::new(PaymentNeedSteps {
        create_person: CreatePerson {
            dao: dao.clone(),
            fnr: fnr.to_owned(),
        },
        personalia: FetchPersonalia {
            dao: dao.clone(),
            fnr: fnr.to_owned(),
            personalia: None,
        },
        open_account: OpenAccount {
            dao: dao.clone(),
            fnr: fnr.to_owned(),
        },
    })
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let store = InMemoryStore::new();
    let dao = PersonDao::default();
    let fnr = "12345678901";

    println!("=== A need is created from a bus message ===");
    let case = Case::new(payment_need(&dao, fnr));
    let id = case.id();
    let halted = match case.start() {
        CaseResult::Halted(case) => case,
        CaseResult::Completed(_) => return Err("need completed without personalia".into()),
    };
    let record = halted.suspend(&store).await?;
    println!(
        "  parked progress {} (suspension #{})",
        record.progress, record.suspensions
    );
    drop(halted);

    println!("\n=== Personalia arrive; the need is rebuilt and resumed ===");
    let mut loaded = Case::load(&store, id, payment_need(&dao, fnr)).await?;
    loaded.root_mut().steps_mut().personalia.personalia = Some(Personalia {
        name: "Hello, World".into(),
        address: "1337 Computer Road".into(),
    });
    let completed = match loaded.resume() {
        CaseResult::Completed(case) => case,
        CaseResult::Halted(case) => {
            return Err(format!("need halted again at {}", case.progress()).into())
        }
    };
    println!("  person: {:?}", dao.get(fnr));
    completed.release(&store).await?;

    println!("\n=== The need is withdrawn ===");
    let fresh = completed.undo();
    println!("  progress: {}", fresh.root().state());
    println!("  person: {:?}", dao.get(fnr));

    Ok(())
}
