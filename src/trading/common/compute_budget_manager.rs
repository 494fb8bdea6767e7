use solana_compute_budget_interface::ComputeBudgetInstruction;
use solana_sdk::instruction::Instruction;

/// Compute-budget instructions to put in front of the swap; empty when neither is set.
pub fn compute_budget_instructions(unit_limit: Option<u32>, unit_price: Option<u64>) -> Vec<Instruction> {
    let mut instructions = Vec::with_capacity(2);
    if let Some(price) = unit_price {
        instructions.push(ComputeBudgetInstruction::set_compute_unit_price(price));
    }
    if let Some(limit) = unit_limit {
        instructions.push(ComputeBudgetInstruction::set_compute_unit_limit(limit));
    }
    instructions
}
