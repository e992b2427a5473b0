//! Test fixtures for seeding and inspecting process stores.

use sk_core::persistence::InMemoryProcessRepository;
use sk_protocol::{Process, ProcessStep, ProcessStepTypeId, ProcessTypeId, StepStatus};
use uuid::Uuid;

/// Seed a process together with pending steps of the given types.
///
/// Returns the id of the new process. Steps are created in the order
/// given, which is the order the store reports them in.
#[allow(dead_code)]
pub fn seed_process(
    repository: &InMemoryProcessRepository,
    process_type: ProcessTypeId,
    step_types: &[ProcessStepTypeId],
) -> Uuid {
    let process = Process::new(process_type);
    let process_id = process.id;
    repository.add_process(process);
    for step_type in step_types {
        repository.add_step(ProcessStep::new(process_id, *step_type));
    }
    process_id
}

/// Return the committed steps of one type, in creation order.
#[allow(dead_code)]
pub fn steps_of_type(
    repository: &InMemoryProcessRepository,
    process_id: Uuid,
    step_type: ProcessStepTypeId,
) -> Vec<ProcessStep> {
    repository
        .steps_of(process_id)
        .into_iter()
        .filter(|step| step.step_type == step_type)
        .collect()
}

/// Return the status of the single committed step of one type.
///
/// Panics when the step is missing or ambiguous so the test fails
/// with a clear message instead of asserting on the wrong record.
#[allow(dead_code)]
pub fn status_of_single(
    repository: &InMemoryProcessRepository,
    process_id: Uuid,
    step_type: ProcessStepTypeId,
) -> StepStatus {
    let steps = steps_of_type(repository, process_id, step_type);
    assert_eq!(
        steps.len(),
        1,
        "expected exactly one {step_type} step, found {}",
        steps.len()
    );
    steps[0].status
}
