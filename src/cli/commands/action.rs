use anyhow::Result;

use super::{ApplyCommand, CliCommand, Command};
use crate::actions::{dispatch, ActionRequest, ActionResponse};
use crate::cli::{Commands, ConfirmArgs, DepositCommands, ReleaseCommands};
use crate::jobs::types::{JobFilter, NewJob};
use crate::service::JobService;

/// A single job action built from command-line arguments
#[derive(Debug, Clone, PartialEq)]
pub struct ActionCommand {
    pub request: ActionRequest,
}

impl From<Commands> for CliCommand {
    fn from(command: Commands) -> Self {
        let action = |request| CliCommand::Action(ActionCommand { request });
        match command {
            Commands::Create {
                title,
                amount,
                client,
                description,
            } => action(ActionRequest::CreateJob(NewJob {
                title,
                amount,
                client_address: client,
                description,
            })),
            Commands::Show { id } => action(ActionRequest::GetJob { id }),
            Commands::List {
                status,
                client,
                freelancer,
            } => action(ActionRequest::ListJobs(JobFilter {
                status,
                client_address: client,
                freelancer_address: freelancer,
            })),
            Commands::Accept { id, freelancer } => action(ActionRequest::Accept {
                id,
                freelancer_address: freelancer,
            }),
            Commands::Submit {
                id,
                freelancer,
                work,
            } => action(ActionRequest::Submit {
                id,
                freelancer_address: freelancer,
                work_reference: work,
            }),
            Commands::Dispute {
                id,
                identity,
                reason,
            } => action(ActionRequest::Dispute {
                id,
                identity,
                reason,
            }),
            Commands::Deposit(DepositCommands::Prepare { id, client, amount }) => {
                action(ActionRequest::DepositPrepare {
                    id,
                    client_address: client,
                    amount,
                })
            }
            Commands::Deposit(DepositCommands::Confirm(ConfirmArgs {
                id,
                client,
                transaction_ref,
            })) => action(ActionRequest::DepositConfirm {
                id,
                client_address: client,
                transaction_ref,
            }),
            Commands::Release(ReleaseCommands::Prepare { id, client }) => {
                action(ActionRequest::ReleasePrepare {
                    id,
                    client_address: client,
                })
            }
            Commands::Release(ReleaseCommands::Confirm(ConfirmArgs {
                id,
                client,
                transaction_ref,
            })) => action(ActionRequest::ReleaseConfirm {
                id,
                client_address: client,
                transaction_ref,
            }),
            Commands::Apply { file } => CliCommand::Apply(ApplyCommand::new(file)),
        }
    }
}

impl Command for ActionCommand {
    async fn execute(&self, service: &JobService) -> Result<ActionResponse> {
        Ok(dispatch(service, self.request.clone()).await)
    }
}
