//! `keymesh-ca init-ca` - Create the CA ahead of any node.

use anyhow::Result;
use keymesh_ca::Provisioner;

use super::{print_ca_outcome, Context};
use crate::cli::args::InitCaArgs;
use crate::explain::Explain;
use crate::output::{print_certificate, print_structured};

pub fn execute(ctx: &Context, args: &InitCaArgs) -> Result<()> {
    let mut config = ctx.provision_config();
    args.ca.apply(&mut config);

    if ctx.explain {
        Explain::init_ca(&config).print();
    }

    let ca = Provisioner::new(config)?.bootstrap()?;

    if !print_structured(ctx.output_format, &ca)? {
        print_ca_outcome(&ca);
        println!();
        print_certificate(&ca.certificate);
    }
    Ok(())
}
