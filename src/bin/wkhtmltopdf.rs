use fakewkhtmltopdf::ExitStatus;

fn main() -> ExitStatus {
    fakewkhtmltopdf::run(std::env::args())
}
