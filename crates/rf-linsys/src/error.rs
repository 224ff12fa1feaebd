use thiserror::Error;

pub type LinSysResult<T> = Result<T, LinSysError>;

#[derive(Error, Debug)]
pub enum LinSysError {
    #[error("Equation index {eq} out of range (num_eq={num_eq})")]
    EquationOob { eq: usize, num_eq: usize },

    #[error("Primary-variable index {pv} out of range (num_pv={num_pv})")]
    VariableOob { pv: usize, num_pv: usize },
}
