/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

use tokio::{self, net::TcpStream, io::{BufReader, AsyncBufReadExt}};
use anyhow::Result;
use argus_common::{define_cli, check_cli};
use argus_etar::sbs::{decode_line, SbsRecord};

define_cli! { ARGS [about="SBS socket monitoring tool"] =
    addr: String [help="host:port from where to read SBS messages"],
    all: bool [help="also print ignored records", long, short]
}

#[tokio::main]
async fn main() -> Result<()> {
    check_cli!(ARGS);

    let stream = TcpStream::connect( &ARGS.addr).await?;
    let reader = BufReader::with_capacity( 4096, stream);
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        match decode_line( &line) {
            Ok(SbsRecord::Accepted(update)) => println!("{update}"),
            Ok(SbsRecord::Ignored) => if ARGS.all { println!("IGNORED {line}") },
            Err(e) => println!("PARSE ERROR {e}")
        }
    }
    Ok(())
}
